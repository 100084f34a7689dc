// Consul network coordinate models

use serde::{Deserialize, Serialize};

use crate::encoding::null_as_default;

/// Vivaldi network coordinate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    #[serde(rename = "Vec", default, deserialize_with = "null_as_default")]
    pub vec: Vec<f64>,

    #[serde(rename = "Error", default)]
    pub error: f64,

    #[serde(rename = "Adjustment", default)]
    pub adjustment: f64,

    #[serde(rename = "Height", default)]
    pub height: f64,
}

/// Coordinate of a single node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(rename = "Node")]
    pub node: String,

    #[serde(rename = "Segment", default)]
    pub segment: String,

    #[serde(rename = "Coord", default)]
    pub coord: Coord,
}

/// WAN coordinates of the servers of one datacenter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DcCoordinates {
    #[serde(rename = "Datacenter")]
    pub datacenter: String,

    #[serde(rename = "AreaID", default)]
    pub area_id: String,

    #[serde(rename = "Coordinates", default, deserialize_with = "null_as_default")]
    pub coordinates: Vec<Coordinate>,
}
