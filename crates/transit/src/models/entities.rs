//! Stop, route, trip and stop-time entities.
//!
//! Identifiers are fixed at construction. Every other field has a setter;
//! setters only touch the entity itself and never notify store observers.

use std::sync::Arc;

use geo::Point;

use crate::identifiers::*;
use crate::models::traits::{ColumnValues, Keyed};
use crate::models::types::*;

// ============================================================================
// Stop
// ============================================================================

/// A boarding location
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stop {
    id: StopIdentifier,
    name: Arc<str>,
    description: Arc<str>,
    latitude: f64,
    longitude: f64,
}

impl Stop {
    pub fn new(
        id: impl Into<StopIdentifier>,
        name: impl Into<Arc<str>>,
        description: impl Into<Arc<str>>,
        latitude: f64,
        longitude: f64,
    ) -> Result<Self> {
        Ok(Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            latitude: check_latitude(latitude)?,
            longitude: check_longitude(longitude)?,
        })
    }

    pub fn id(&self) -> &StopIdentifier {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Location as a `geo` point (x = longitude, y = latitude)
    pub fn location(&self) -> Point {
        Point::new(self.longitude, self.latitude)
    }

    pub fn set_name(&mut self, name: impl Into<Arc<str>>) {
        self.name = name.into();
    }

    pub fn set_description(&mut self, description: impl Into<Arc<str>>) {
        self.description = description.into();
    }

    pub fn set_latitude(&mut self, latitude: f64) -> Result<()> {
        self.latitude = check_latitude(latitude)?;
        Ok(())
    }

    pub fn set_longitude(&mut self, longitude: f64) -> Result<()> {
        self.longitude = check_longitude(longitude)?;
        Ok(())
    }

    /// Set both coordinates; neither changes unless both are in range.
    pub fn set_location(&mut self, latitude: f64, longitude: f64) -> Result<()> {
        let latitude = check_latitude(latitude)?;
        let longitude = check_longitude(longitude)?;
        self.latitude = latitude;
        self.longitude = longitude;
        Ok(())
    }
}

fn check_latitude(latitude: f64) -> Result<f64> {
    if (-90.0..=90.0).contains(&latitude) {
        Ok(latitude)
    } else {
        Err(TransitError::LatitudeOutOfRange(latitude))
    }
}

fn check_longitude(longitude: f64) -> Result<f64> {
    if (-180.0..=180.0).contains(&longitude) {
        Ok(longitude)
    } else {
        Err(TransitError::LongitudeOutOfRange(longitude))
    }
}

impl Keyed for Stop {
    fn key(&self) -> &str {
        self.id.as_str()
    }
}

impl ColumnValues for Stop {
    const COLUMNS: &'static [&'static str] =
        &["stop_id", "stop_name", "stop_desc", "stop_lat", "stop_lon"];

    fn column_values(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.to_string(),
            self.description.to_string(),
            format_coordinate(self.latitude),
            format_coordinate(self.longitude),
        ]
    }
}

// Always keep a decimal point, so whole degrees export as "40.0" rather than "40"
fn format_coordinate(value: f64) -> String {
    let formatted = value.to_string();
    if formatted.contains('.') {
        formatted
    } else {
        formatted + ".0"
    }
}

// ============================================================================
// Route
// ============================================================================

/// A transit route (e.g., "Red Line", "Route 66")
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    id: RouteIdentifier,
    agency_id: AgencyIdentifier,
    short_name: Arc<str>,
    long_name: Arc<str>,
    description: Arc<str>,
    route_type: i32,
    url: Arc<str>,
    color: Option<Arc<str>>,
    text_color: Option<Arc<str>>,
    pub(crate) stop_time_ids: Vec<StopTimeId>,
}

impl Route {
    pub fn new(
        id: impl Into<RouteIdentifier>,
        agency_id: impl Into<AgencyIdentifier>,
        route_type: i32,
    ) -> Self {
        Self {
            id: id.into(),
            agency_id: agency_id.into(),
            short_name: "".into(),
            long_name: "".into(),
            description: "".into(),
            route_type,
            url: "".into(),
            color: None,
            text_color: None,
            stop_time_ids: Vec::new(),
        }
    }

    pub fn with_names(
        mut self,
        short_name: impl Into<Arc<str>>,
        long_name: impl Into<Arc<str>>,
    ) -> Self {
        self.short_name = short_name.into();
        self.long_name = long_name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<Arc<str>>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<Arc<str>>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_colors(mut self, color: &str, text_color: &str) -> Result<Self> {
        self.set_color(color)?;
        self.set_text_color(text_color)?;
        Ok(self)
    }

    pub fn id(&self) -> &RouteIdentifier {
        &self.id
    }

    pub fn agency_id(&self) -> &AgencyIdentifier {
        &self.agency_id
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn long_name(&self) -> &str {
        &self.long_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Raw GTFS route type code
    pub fn route_type(&self) -> i32 {
        self.route_type
    }

    pub fn kind(&self) -> Option<RouteType> {
        RouteType::from_gtfs(self.route_type)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Hex RGB, e.g. "FF0000"
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn text_color(&self) -> Option<&str> {
        self.text_color.as_deref()
    }

    /// Stop-times of every trip on this route, in stop-time sequence order
    pub fn stop_time_ids(&self) -> &[StopTimeId] {
        &self.stop_time_ids
    }

    pub fn set_agency_id(&mut self, agency_id: impl Into<AgencyIdentifier>) {
        self.agency_id = agency_id.into();
    }

    pub fn set_short_name(&mut self, short_name: impl Into<Arc<str>>) {
        self.short_name = short_name.into();
    }

    pub fn set_long_name(&mut self, long_name: impl Into<Arc<str>>) {
        self.long_name = long_name.into();
    }

    pub fn set_description(&mut self, description: impl Into<Arc<str>>) {
        self.description = description.into();
    }

    pub fn set_route_type(&mut self, route_type: i32) {
        self.route_type = route_type;
    }

    pub fn set_url(&mut self, url: impl Into<Arc<str>>) {
        self.url = url.into();
    }

    /// An empty string clears the color.
    pub fn set_color(&mut self, color: &str) -> Result<()> {
        self.color = parse_color(color)?;
        Ok(())
    }

    pub fn set_text_color(&mut self, text_color: &str) -> Result<()> {
        self.text_color = parse_color(text_color)?;
        Ok(())
    }
}

fn parse_color(color: &str) -> Result<Option<Arc<str>>> {
    if color.is_empty() {
        return Ok(None);
    }
    if color.len() == 6 && color.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(Some(color.into()))
    } else {
        Err(TransitError::InvalidColor(color.to_owned()))
    }
}

impl Keyed for Route {
    fn key(&self) -> &str {
        self.id.as_str()
    }
}

impl ColumnValues for Route {
    const COLUMNS: &'static [&'static str] = &[
        "route_id",
        "agency_id",
        "route_short_name",
        "route_long_name",
        "route_desc",
        "route_type",
        "route_url",
        "route_color",
        "route_text_color",
    ];

    fn column_values(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.agency_id.to_string(),
            self.short_name.to_string(),
            self.long_name.to_string(),
            self.description.to_string(),
            self.route_type.to_string(),
            self.url.to_string(),
            self.color.as_deref().unwrap_or_default().to_owned(),
            self.text_color.as_deref().unwrap_or_default().to_owned(),
        ]
    }
}

// ============================================================================
// Trip
// ============================================================================

/// A single vehicle run along a route
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trip {
    id: TripIdentifier,
    route_id: RouteIdentifier,
    service_id: ServiceIdentifier,
    headsign: Arc<str>,
    direction_id: Option<DirectionId>,
    block_id: Arc<str>,
    shape_id: Arc<str>,
    pub(crate) stop_time_ids: Vec<StopTimeId>,
}

impl Trip {
    pub fn new(
        id: impl Into<TripIdentifier>,
        route_id: impl Into<RouteIdentifier>,
        service_id: impl Into<ServiceIdentifier>,
    ) -> Self {
        Self {
            id: id.into(),
            route_id: route_id.into(),
            service_id: service_id.into(),
            headsign: "".into(),
            direction_id: None,
            block_id: "".into(),
            shape_id: "".into(),
            stop_time_ids: Vec::new(),
        }
    }

    pub fn with_headsign(mut self, headsign: impl Into<Arc<str>>) -> Self {
        self.headsign = headsign.into();
        self
    }

    pub fn with_direction(mut self, direction_id: DirectionId) -> Self {
        self.direction_id = Some(direction_id);
        self
    }

    pub fn with_block_and_shape(
        mut self,
        block_id: impl Into<Arc<str>>,
        shape_id: impl Into<Arc<str>>,
    ) -> Self {
        self.block_id = block_id.into();
        self.shape_id = shape_id.into();
        self
    }

    pub fn id(&self) -> &TripIdentifier {
        &self.id
    }

    pub fn route_id(&self) -> &RouteIdentifier {
        &self.route_id
    }

    pub fn service_id(&self) -> &ServiceIdentifier {
        &self.service_id
    }

    /// Display name (e.g., "Downtown", "To City Center")
    pub fn headsign(&self) -> &str {
        &self.headsign
    }

    pub fn direction_id(&self) -> Option<DirectionId> {
        self.direction_id
    }

    pub fn block_id(&self) -> &str {
        &self.block_id
    }

    pub fn shape_id(&self) -> &str {
        &self.shape_id
    }

    /// Stop-times of this trip, in stop-time sequence (file) order
    pub fn stop_time_ids(&self) -> &[StopTimeId] {
        &self.stop_time_ids
    }

    /// Changing the route only takes effect in route reference lists once
    /// relationships are rebuilt.
    pub fn set_route_id(&mut self, route_id: impl Into<RouteIdentifier>) {
        self.route_id = route_id.into();
    }

    pub fn set_service_id(&mut self, service_id: impl Into<ServiceIdentifier>) {
        self.service_id = service_id.into();
    }

    pub fn set_headsign(&mut self, headsign: impl Into<Arc<str>>) {
        self.headsign = headsign.into();
    }

    pub fn set_direction_id(&mut self, direction_id: Option<DirectionId>) {
        self.direction_id = direction_id;
    }

    pub fn set_block_id(&mut self, block_id: impl Into<Arc<str>>) {
        self.block_id = block_id.into();
    }

    pub fn set_shape_id(&mut self, shape_id: impl Into<Arc<str>>) {
        self.shape_id = shape_id.into();
    }
}

impl Keyed for Trip {
    fn key(&self) -> &str {
        self.id.as_str()
    }
}

impl ColumnValues for Trip {
    const COLUMNS: &'static [&'static str] = &[
        "route_id",
        "service_id",
        "trip_id",
        "trip_headsign",
        "direction_id",
        "block_id",
        "shape_id",
    ];

    fn column_values(&self) -> Vec<String> {
        vec![
            self.route_id.to_string(),
            self.service_id.to_string(),
            self.id.to_string(),
            self.headsign.to_string(),
            self.direction_id
                .map(|d| d.as_gtfs().to_string())
                .unwrap_or_default(),
            self.block_id.to_string(),
            self.shape_id.to_string(),
        ]
    }
}

// ============================================================================
// Stop Time
// ============================================================================

/// A single stop event in a trip (arrival/departure at a stop)
///
/// The identity is assigned by the store when the stop-time is loaded and is
/// only valid for the current load generation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StopTime {
    pub(crate) id: StopTimeId,
    trip_id: TripIdentifier,
    stop_id: StopIdentifier,
    arrival: ServiceTime,
    departure: ServiceTime,
    stop_sequence: u32,
    headsign: Arc<str>,
    pickup_type: Option<BoardingType>,
    drop_off_type: Option<BoardingType>,
}

impl StopTime {
    pub fn new(
        trip_id: impl Into<TripIdentifier>,
        stop_id: impl Into<StopIdentifier>,
        arrival: ServiceTime,
        departure: ServiceTime,
        stop_sequence: u32,
    ) -> Self {
        Self {
            id: StopTimeId::default(),
            trip_id: trip_id.into(),
            stop_id: stop_id.into(),
            arrival,
            departure,
            stop_sequence,
            headsign: "".into(),
            pickup_type: None,
            drop_off_type: None,
        }
    }

    pub fn with_headsign(mut self, headsign: impl Into<Arc<str>>) -> Self {
        self.headsign = headsign.into();
        self
    }

    pub fn with_boarding(
        mut self,
        pickup_type: Option<BoardingType>,
        drop_off_type: Option<BoardingType>,
    ) -> Self {
        self.pickup_type = pickup_type;
        self.drop_off_type = drop_off_type;
        self
    }

    /// Identity within the current load generation
    pub fn id(&self) -> StopTimeId {
        self.id
    }

    pub fn trip_id(&self) -> &TripIdentifier {
        &self.trip_id
    }

    pub fn stop_id(&self) -> &StopIdentifier {
        &self.stop_id
    }

    pub fn arrival(&self) -> ServiceTime {
        self.arrival
    }

    pub fn departure(&self) -> ServiceTime {
        self.departure
    }

    pub fn stop_sequence(&self) -> u32 {
        self.stop_sequence
    }

    pub fn headsign(&self) -> &str {
        &self.headsign
    }

    pub fn pickup_type(&self) -> Option<BoardingType> {
        self.pickup_type
    }

    pub fn drop_off_type(&self) -> Option<BoardingType> {
        self.drop_off_type
    }

    pub fn set_trip_id(&mut self, trip_id: impl Into<TripIdentifier>) {
        self.trip_id = trip_id.into();
    }

    pub fn set_stop_id(&mut self, stop_id: impl Into<StopIdentifier>) {
        self.stop_id = stop_id.into();
    }

    pub fn set_arrival(&mut self, arrival: ServiceTime) {
        self.arrival = arrival;
    }

    pub fn set_departure(&mut self, departure: ServiceTime) {
        self.departure = departure;
    }

    pub fn set_stop_sequence(&mut self, stop_sequence: u32) {
        self.stop_sequence = stop_sequence;
    }

    pub fn set_headsign(&mut self, headsign: impl Into<Arc<str>>) {
        self.headsign = headsign.into();
    }

    pub fn set_pickup_type(&mut self, pickup_type: Option<BoardingType>) {
        self.pickup_type = pickup_type;
    }

    pub fn set_drop_off_type(&mut self, drop_off_type: Option<BoardingType>) {
        self.drop_off_type = drop_off_type;
    }
}

impl ColumnValues for StopTime {
    const COLUMNS: &'static [&'static str] = &[
        "trip_id",
        "arrival_time",
        "departure_time",
        "stop_id",
        "stop_sequence",
        "stop_headsign",
        "pickup_type",
        "drop_off_type",
    ];

    fn column_values(&self) -> Vec<String> {
        vec![
            self.trip_id.to_string(),
            self.arrival.to_string(),
            self.departure.to_string(),
            self.stop_id.to_string(),
            self.stop_sequence.to_string(),
            self.headsign.to_string(),
            self.pickup_type
                .map(|t| t.as_gtfs().to_string())
                .unwrap_or_default(),
            self.drop_off_type
                .map(|t| t.as_gtfs().to_string())
                .unwrap_or_default(),
        ]
    }
}
