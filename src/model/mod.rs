//! Core data model: locations, the location table, and the
//! transformations applied to it before serialization.
//!
//! Everything in this module is pure and synchronous. The table is built
//! once per upload, and every transformation (`round_locations`,
//! `logarithmic`, `within`) produces a new table rather than mutating in
//! place.

mod ingest;

pub use ingest::{location_table_from_csv, IngestError};

use std::collections::hash_map;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

/// A point on the earth's surface, in degrees.
///
/// Used as a map key: equality and hashing are bitwise over the raw `f64`
/// representation, not within-epsilon. Two coordinates that differ by a
/// single ULP are distinct locations and will not merge. This is fragile
/// but intentional; callers wanting coarser grouping should use
/// [`LocationTable::round_locations`].
#[derive(Debug, Clone, Copy)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.latitude.to_bits() == other.latitude.to_bits()
            && self.longitude.to_bits() == other.longitude.to_bits()
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.latitude.to_bits().hash(state);
        self.longitude.to_bits().hash(state);
    }
}

/// A rectangle in latitude/longitude space used to filter query results.
///
/// `north >= south` is expected but not enforced. Longitude bounds form a
/// half-open interval `(west, east]`. There is no wraparound across the
/// ±180° seam; a box spanning the seam must be issued as two queries.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Whether `location` falls inside the box:
    /// `south <= lat <= north` and `west < lon <= east`.
    pub fn contains(&self, location: &Location) -> bool {
        self.south <= location.latitude
            && location.latitude <= self.north
            && self.west < location.longitude
            && location.longitude <= self.east
    }
}

/// Associates locations with the quantity of IP addresses assigned there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationTable {
    entries: HashMap<Location, f64>,
}

impl LocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, location: &Location) -> Option<f64> {
        self.entries.get(location).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Location, f64)> {
        self.entries.iter().map(|(location, &quantity)| (location, quantity))
    }

    /// Adds `quantity` to the entry for `location`, creating it if absent.
    pub fn add(&mut self, location: Location, quantity: f64) {
        *self.entries.entry(location).or_insert(0.0) += quantity;
    }

    /// Merges two tables, summing the quantities of identical locations.
    ///
    /// Deterministic regardless of which table is `self` and which is
    /// `other`, up to floating-point addition order per key.
    pub fn merge(mut self, other: LocationTable) -> LocationTable {
        for (location, quantity) in other.entries {
            self.add(location, quantity);
        }
        self
    }

    /// Reduces the resolution of the table by rounding each longitude to
    /// the nearest multiple of `x_step` degrees and each latitude to the
    /// nearest multiple of `y_step` degrees, summing the quantities of
    /// locations that round to the same pair of coordinates.
    ///
    /// A step of zero leaves that axis unrounded. Rounding is idempotent
    /// under an equal step, and rounding with a coarser step after a finer
    /// one is equivalent to rounding directly with the coarser step when
    /// the coarser step is an integer multiple of the finer.
    pub fn round_locations(&self, x_step: f64, y_step: f64) -> LocationTable {
        let mut rounded = LocationTable::new();

        for (location, quantity) in self.iter() {
            rounded.add(
                Location {
                    latitude: round_to_nearest_multiple(location.latitude, y_step),
                    longitude: round_to_nearest_multiple(location.longitude, x_step),
                },
                quantity,
            );
        }

        rounded
    }

    /// Returns a table in which every quantity q is replaced with
    /// log_base(q).
    ///
    /// Quantities of zero or below produce a non-finite value (NaN or
    /// negative infinity) which is propagated as-is; `serde_json` renders
    /// such values as `null`. Address counts produced by ingestion are
    /// always >= 1, so this only arises with hand-built tables.
    pub fn logarithmic(&self, base: f64) -> LocationTable {
        let log_base = base.ln();
        let mut scaled = LocationTable::new();

        for (location, quantity) in self.iter() {
            scaled.add(*location, quantity.ln() / log_base);
        }

        scaled
    }

    /// Filters the table to the entries inside `bounds`.
    pub fn within(&self, bounds: &BoundingBox) -> LocationTable {
        let mut filtered = LocationTable::new();

        for (location, quantity) in self.iter() {
            if bounds.contains(location) {
                filtered.add(*location, quantity);
            }
        }

        filtered
    }

    /// Flattens the table into `[latitude, longitude, quantity]` triples.
    ///
    /// The backing map is unordered, so the order of triples is not
    /// guaranteed to be stable across calls; consumers must not rely on it.
    pub fn flatten(&self) -> Vec<[f64; 3]> {
        self.iter()
            .map(|(location, quantity)| [location.latitude, location.longitude, quantity])
            .collect()
    }

    /// Sum of all quantities in the table.
    pub fn total_quantity(&self) -> f64 {
        self.entries.values().sum()
    }
}

impl FromIterator<(Location, f64)> for LocationTable {
    fn from_iter<I: IntoIterator<Item = (Location, f64)>>(iter: I) -> Self {
        let mut table = LocationTable::new();
        for (location, quantity) in iter {
            table.add(location, quantity);
        }
        table
    }
}

impl IntoIterator for LocationTable {
    type Item = (Location, f64);
    type IntoIter = hash_map::IntoIter<Location, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// The wire format is the flattened form: a JSON array of three-element
/// `[lat, lon, quantity]` arrays.
impl Serialize for LocationTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for triple in self.flatten() {
            seq.serialize_element(&triple)?;
        }
        seq.end()
    }
}

/// Rounds `n` to the nearest multiple of `m`, half away from the floor:
/// `floor((n + m/2) / m) * m`. A multiple of zero is an identity.
pub fn round_to_nearest_multiple(n: f64, m: f64) -> f64 {
    if m == 0.0 {
        return n;
    }
    ((n + m / 2.0) / m).floor() * m
}

/// Normalizes a longitude value to the range [-180, 180).
///
/// Not applied anywhere in the query path: bounding-box queries keep
/// no-wraparound semantics, and callers that want a box across the
/// antimeridian must split it themselves.
pub fn normalize_longitude(degrees: f64) -> f64 {
    let mut degrees = degrees % 360.0;
    if degrees < -180.0 {
        degrees += 360.0;
    } else if degrees >= 180.0 {
        degrees -= 360.0;
    }
    degrees
}
