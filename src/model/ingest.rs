//! CSV ingestion: expands CIDR allocation records into a [`LocationTable`].

use std::io::Read;

use ipnet::IpNet;
use thiserror::Error;

use super::{Location, LocationTable};

/// Errors produced while ingesting a CSV payload.
///
/// Only [`IngestError::MissingColumns`] is the client's fault; everything
/// else is treated as an internal failure and aborts the whole ingestion
/// with no partial table produced.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The header row does not name all of `network`, `latitude`, and
    /// `longitude`.
    #[error("missing required columns (need network, latitude, longitude)")]
    MissingColumns,

    /// A data row has no value at the position of a required column.
    #[error("line {line}: missing {column} field")]
    MissingField { line: u64, column: &'static str },

    /// A coordinate failed to parse as a float.
    #[error("line {line}: invalid {column}: {source}")]
    InvalidCoordinate {
        line: u64,
        column: &'static str,
        source: std::num::ParseFloatError,
    },

    /// The network column failed to parse as a CIDR block.
    #[error("line {line}: invalid network: {source}")]
    InvalidNetwork {
        line: u64,
        source: ipnet::AddrParseError,
    },

    /// A structural CSV error (for example, a row with the wrong number of
    /// fields).
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl IngestError {
    /// Whether the error is caused by the client's input (HTTP 400) rather
    /// than an internal failure (HTTP 500).
    pub fn is_client_error(&self) -> bool {
        matches!(self, IngestError::MissingColumns)
    }
}

/// Builds a location table from CSV data.
///
/// The first row must name the columns; `network`, `latitude`, and
/// `longitude` are required (case-sensitive, any order) and any other
/// columns are ignored. Each data row contributes the address count of its
/// CIDR block to the entry for its exact coordinates; rows with identical
/// coordinates accumulate.
///
/// The count for a block with n host bits is 2^(n-1) — half the block,
/// biased toward usable hosts — except that a block with no host bits
/// still counts as a single address. Both IPv4 and IPv6 networks are
/// accepted.
pub fn location_table_from_csv<R: Read>(reader: R) -> Result<LocationTable, IngestError> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let headers = csv_reader.headers()?;
    let mut network_index = None;
    let mut latitude_index = None;
    let mut longitude_index = None;
    for (i, name) in headers.iter().enumerate() {
        match name {
            "network" => network_index = Some(i),
            "latitude" => latitude_index = Some(i),
            "longitude" => longitude_index = Some(i),
            _ => {}
        }
    }
    let (Some(network_index), Some(latitude_index), Some(longitude_index)) =
        (network_index, latitude_index, longitude_index)
    else {
        return Err(IngestError::MissingColumns);
    };

    let mut table = LocationTable::new();

    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let latitude = field(&record, line, latitude_index, "latitude")?
            .parse::<f64>()
            .map_err(|source| IngestError::InvalidCoordinate {
                line,
                column: "latitude",
                source,
            })?;

        let longitude = field(&record, line, longitude_index, "longitude")?
            .parse::<f64>()
            .map_err(|source| IngestError::InvalidCoordinate {
                line,
                column: "longitude",
                source,
            })?;

        let network = field(&record, line, network_index, "network")?
            .parse::<IpNet>()
            .map_err(|source| IngestError::InvalidNetwork { line, source })?;

        table.add(
            Location { latitude, longitude },
            network_quantity(&network),
        );
    }

    Ok(table)
}

fn field<'r>(
    record: &'r csv::StringRecord,
    line: u64,
    index: usize,
    column: &'static str,
) -> Result<&'r str, IngestError> {
    record
        .get(index)
        .ok_or(IngestError::MissingField { line, column })
}

/// Estimated count of assignable addresses in a network: 2^(hostBits - 1),
/// with a floor of 1 for a single-address block.
fn network_quantity(network: &IpNet) -> f64 {
    let host_bits = network.max_prefix_len() - network.prefix_len();
    if host_bits < 1 {
        1.0
    } else {
        2f64.powi(i32::from(host_bits) - 1)
    }
}
