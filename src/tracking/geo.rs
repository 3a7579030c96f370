// ABOUTME: Great-circle distance and coordinate validation for raw position fixes
// ABOUTME: Haversine formula on a spherical Earth, accurate to well under 1% at running scales
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use pierre_core::constants::geo::{EARTH_RADIUS_M, MAX_LATITUDE, MAX_LONGITUDE};

/// Great-circle distance between two coordinates in meters
#[must_use]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Whether latitude/longitude are finite and inside their valid ranges
#[must_use]
pub fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && latitude.abs() <= MAX_LATITUDE
        && longitude.abs() <= MAX_LONGITUDE
}
