//! Geodetic and kinematic math shared by every filter.
//!
//! Pure, deterministic, side-effect-free. Every function validates its inputs
//! and returns [`GeometryError`] on NaN or out-of-range coordinates rather than
//! panicking, matching the toolkit-level Validation error kind.

use crate::error::{GeometryError, GeometryResult};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub fn deg2rad(deg: f64) -> f64 {
    deg * std::f64::consts::PI / 180.0
}

pub fn rad2deg(rad: f64) -> f64 {
    rad * 180.0 / std::f64::consts::PI
}

/// Normalize an angle to `[0, 360)`.
pub fn normalize_deg(deg: f64) -> f64 {
    let wrapped = deg % 360.0;
    if wrapped < 0.0 { wrapped + 360.0 } else { wrapped }
}

/// Normalize a longitude to `(-180, 180]`.
pub fn normalize_lon(lon: f64) -> f64 {
    let mut wrapped = lon % 360.0;
    if wrapped <= -180.0 {
        wrapped += 360.0;
    } else if wrapped > 180.0 {
        wrapped -= 360.0;
    }
    wrapped
}

fn check_finite(v: f64) -> GeometryResult<()> {
    if v.is_finite() { Ok(()) } else { Err(GeometryError::NotFinite) }
}

fn check_lat(lat: f64) -> GeometryResult<()> {
    check_finite(lat)?;
    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeometryError::LatitudeOutOfRange(lat));
    }
    Ok(())
}

fn check_lon(lon: f64) -> GeometryResult<()> {
    check_finite(lon)?;
    if !(-180.0..=180.0).contains(&lon) {
        return Err(GeometryError::LongitudeOutOfRange(lon));
    }
    Ok(())
}

fn check_point(lat: f64, lon: f64) -> GeometryResult<()> {
    check_lat(lat)?;
    check_lon(lon)
}

/// Great-circle distance in kilometers (haversine, Earth radius 6371 km).
pub fn calculate_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> GeometryResult<f64> {
    check_point(lat1, lon1)?;
    check_point(lat2, lon2)?;

    let phi1 = deg2rad(lat1);
    let phi2 = deg2rad(lat2);
    let d_phi = deg2rad(lat2 - lat1);
    let d_lambda = deg2rad(lon2 - lon1);

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    Ok(EARTH_RADIUS_KM * c)
}

/// Forward azimuth from point 1 to point 2, degrees in `[0, 360)`.
pub fn calculate_bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> GeometryResult<f64> {
    check_point(lat1, lon1)?;
    check_point(lat2, lon2)?;

    let phi1 = deg2rad(lat1);
    let phi2 = deg2rad(lat2);
    let d_lambda = deg2rad(lon2 - lon1);

    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();
    Ok(normalize_deg(rad2deg(y.atan2(x))))
}

/// 16-point compass rose for a bearing in `[0, 360)`.
pub fn cardinal_bearing(bearing_deg: f64) -> &'static str {
    const POINTS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];
    let idx = ((normalize_deg(bearing_deg) / 22.5) + 0.5).floor() as usize % 16;
    POINTS[idx]
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct RelativePosition {
    pub distance: f64,
    pub bearing: f64,
    pub cardinal_bearing: &'static str,
    /// Track relative to bearing-to-station, `(-180, 180]`.
    pub relative_track: f64,
    pub approaching_station: bool,
}

/// Position of a target aircraft relative to the observing station, including
/// whether its current track is carrying it toward the station.
pub fn calculate_relative_position(
    ref_lat: f64,
    ref_lon: f64,
    target_lat: f64,
    target_lon: f64,
    track: f64,
) -> GeometryResult<RelativePosition> {
    check_finite(track)?;
    let distance = calculate_distance(ref_lat, ref_lon, target_lat, target_lon)?;
    let bearing_to_station = normalize_deg(calculate_bearing(target_lat, target_lon, ref_lat, ref_lon)?);

    let mut relative_track = normalize_deg(track) - bearing_to_station;
    relative_track = normalize_deg(relative_track + 180.0) - 180.0;
    if relative_track <= -180.0 {
        relative_track += 360.0;
    }

    Ok(RelativePosition {
        distance,
        bearing: calculate_bearing(ref_lat, ref_lon, target_lat, target_lon)?,
        cardinal_bearing: cardinal_bearing(calculate_bearing(ref_lat, ref_lon, target_lat, target_lon)?),
        relative_track,
        approaching_station: relative_track.abs() < 90.0,
    })
}

/// Spherical (not flat-earth) projection of a point `distance_km` along
/// `bearing_deg` from `(lat, lon)`.
pub fn project_position(
    lat: f64,
    lon: f64,
    distance_km: f64,
    bearing_deg: f64,
) -> GeometryResult<(f64, f64)> {
    check_point(lat, lon)?;
    check_finite(distance_km)?;
    check_finite(bearing_deg)?;

    let angular_distance = distance_km / EARTH_RADIUS_KM;
    let phi1 = deg2rad(lat);
    let theta = deg2rad(bearing_deg);

    let phi2 = (phi1.sin() * angular_distance.cos()
        + phi1.cos() * angular_distance.sin() * theta.cos())
    .clamp(-1.0, 1.0)
    .asin();

    let y = theta.sin() * angular_distance.sin() * phi1.cos();
    let x = angular_distance.cos() - phi1.sin() * phi2.sin();
    let lambda2 = deg2rad(lon) + y.atan2(x);

    Ok((rad2deg(phi2), normalize_lon(rad2deg(lambda2))))
}

/// Angle above the horizon to an aircraft at `dist_km`, `alt_ft` above the
/// observer. Applies an Earth-curvature correction once distance exceeds 10 km.
pub fn calculate_vertical_angle(dist_km: f64, alt_ft: f64, obs_lat: f64) -> GeometryResult<f64> {
    check_finite(dist_km)?;
    check_finite(alt_ft)?;
    check_lat(obs_lat)?;

    let alt_km = feet_to_km(alt_ft);
    let curvature_drop_km = if dist_km > 10.0 {
        (dist_km * dist_km) / (2.0 * EARTH_RADIUS_KM)
    } else {
        0.0
    };
    let effective_alt_km = alt_km - curvature_drop_km;
    Ok(rad2deg((effective_alt_km / dist_km.max(1e-9)).atan()))
}

pub fn nm_to_km(nm: f64) -> f64 {
    1.852 * nm
}

pub fn knots_to_km_per_min(knots: f64) -> f64 {
    nm_to_km(knots) / 60.0
}

pub fn feet_to_km(feet: f64) -> f64 {
    0.0003048 * feet
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossTrack {
    /// Signed perpendicular distance from the observer to the track line, km.
    pub cross_track: f64,
    /// Absolute distance along the track from the nearest point to the
    /// observer, km.
    pub along_track: f64,
    pub is_approaching: bool,
}

/// Cross-track and along-track distance of the observer relative to the
/// aircraft's great-circle track.
pub fn calculate_cross_track_distance(
    obs_lat: f64,
    obs_lon: f64,
    ac_lat: f64,
    ac_lon: f64,
    track: f64,
) -> GeometryResult<CrossTrack> {
    check_finite(track)?;
    let d13 = calculate_distance(ac_lat, ac_lon, obs_lat, obs_lon)? / EARTH_RADIUS_KM;
    let bearing13 = deg2rad(calculate_bearing(ac_lat, ac_lon, obs_lat, obs_lon)?);
    let bearing12 = deg2rad(track);

    let cross_track = (d13.sin() * (bearing13 - bearing12).sin()).asin() * EARTH_RADIUS_KM;
    let along_track =
        ((d13.cos() / (cross_track / EARTH_RADIUS_KM).cos()).acos() * EARTH_RADIUS_KM).abs();

    let relative_bearing = normalize_deg(rad2deg(bearing13) - track);
    let is_approaching = relative_bearing < 90.0 || relative_bearing > 270.0;

    Ok(CrossTrack {
        cross_track,
        along_track,
        is_approaching,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosureGeometry {
    /// Positive when the pair is converging, negative when diverging, in knots.
    pub closure_rate_kt: f64,
    /// Positive seconds to CPA when converging; negative when diverging.
    pub time_to_cpa_s: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct TrackState {
    pub lat: f64,
    pub lon: f64,
    pub track_deg: f64,
    pub gs_kt: f64,
}

/// Relative-velocity closure geometry between two aircraft using a flat local
/// approximation (valid at the separations airprox cares about, a few NM).
pub fn closure_geometry(a1: TrackState, a2: TrackState) -> GeometryResult<ClosureGeometry> {
    check_point(a1.lat, a1.lon)?;
    check_point(a2.lat, a2.lon)?;
    check_finite(a1.track_deg)?;
    check_finite(a2.track_deg)?;
    check_finite(a1.gs_kt)?;
    check_finite(a2.gs_kt)?;

    let distance_km = calculate_distance(a1.lat, a1.lon, a2.lat, a2.lon)?;
    let bearing_to_a2 = deg2rad(calculate_bearing(a1.lat, a1.lon, a2.lat, a2.lon)?);

    // Velocity components in a local east/north frame, km/h.
    let v1x = nm_to_km(a1.gs_kt) * deg2rad(a1.track_deg).sin();
    let v1y = nm_to_km(a1.gs_kt) * deg2rad(a1.track_deg).cos();
    let v2x = nm_to_km(a2.gs_kt) * deg2rad(a2.track_deg).sin();
    let v2y = nm_to_km(a2.gs_kt) * deg2rad(a2.track_deg).cos();

    let rel_vx = v2x - v1x;
    let rel_vy = v2y - v1y;

    // Line-of-sight unit vector from a1 to a2.
    let los_x = bearing_to_a2.sin();
    let los_y = bearing_to_a2.cos();

    // Closing speed is the negative of the radial component of relative
    // velocity along the line of sight (relative velocity pointing away from
    // a1 means separation growing, i.e. diverging).
    let radial_speed_kmh = rel_vx * los_x + rel_vy * los_y;
    let closure_rate_kmh = -radial_speed_kmh;
    let closure_rate_kt = closure_rate_kmh / 1.852;

    let time_to_cpa_s = if closure_rate_kmh.abs() < 1e-6 {
        f64::INFINITY
    } else {
        (distance_km / closure_rate_kmh) * 3600.0
    };

    Ok(ClosureGeometry {
        closure_rate_kt,
        time_to_cpa_s,
    })
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Sample mean/stddev/min/max. Empty input yields all-zero stats.
pub fn calculate_stats(values: &[f64]) -> Stats {
    if values.is_empty() {
        return Stats::default();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Stats {
        mean,
        std_dev: variance.sqrt(),
        min: values.iter().cloned().fold(f64::INFINITY, f64::min),
        max: values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
    }
}
