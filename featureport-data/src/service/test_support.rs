//! JSON documents shaped like ArcGIS REST responses, for mocking a layer.
//!
//! The documents mirror [`featureport_core::test_support::point_descriptor`]
//! and [`featureport_core::test_support::point_feature`]: a WGS 84 point
//! layer with `OBJECTID`, `NAME`, `CREATED` and `ELEV` fields.
//!
//! # Example
//!
//! ```
//! use featureport_data::service::test_support::{object_ids_body, point_layer_metadata};
//!
//! let metadata = point_layer_metadata(1000);
//! assert_eq!(metadata["maxRecordCount"], 1000);
//! assert_eq!(object_ids_body(&[1, 2])["objectIds"][1], 2);
//! ```

use featureport_core::ObjectId;
use serde_json::{Value, json};

/// Layer metadata for the point layer.
#[must_use]
pub fn point_layer_metadata(max_record_count: u32) -> Value {
    json!({
        "currentVersion": 10.91,
        "id": 0,
        "name": "Places",
        "type": "Feature Layer",
        "geometryType": "esriGeometryPoint",
        "objectIdField": "OBJECTID",
        "maxRecordCount": max_record_count,
        "extent": {
            "xmin": -11.5, "ymin": 4.3, "xmax": -7.4, "ymax": 8.6,
            "spatialReference": { "wkid": 4326, "latestWkid": 4326 }
        },
        "fields": [
            { "name": "OBJECTID", "alias": "OBJECTID", "type": "esriFieldTypeOID" },
            { "name": "NAME", "alias": "Name", "type": "esriFieldTypeString", "length": 50 },
            { "name": "CREATED", "alias": "Created", "type": "esriFieldTypeDate" },
            { "name": "ELEV", "alias": "Elevation", "type": "esriFieldTypeDouble" }
        ]
    })
}

/// Identifier listing for `ids`; an empty slice yields `"objectIds": null`.
#[must_use]
pub fn object_ids_body(ids: &[ObjectId]) -> Value {
    let object_ids = if ids.is_empty() {
        Value::Null
    } else {
        json!(ids)
    };
    json!({ "objectIdFieldName": "OBJECTID", "objectIds": object_ids })
}

/// Feature query result holding one point feature per identifier.
#[must_use]
pub fn point_features_body(ids: &[ObjectId]) -> Value {
    let features: Vec<Value> = ids.iter().map(|&id| point_feature_json(id)).collect();
    json!({
        "objectIdFieldName": "OBJECTID",
        "geometryType": "esriGeometryPoint",
        "spatialReference": { "wkid": 4326, "latestWkid": 4326 },
        "fields": [],
        "features": features
    })
}

/// A single point feature.
#[must_use]
pub fn point_feature_json(id: ObjectId) -> Value {
    json!({
        "attributes": {
            "OBJECTID": id,
            "NAME": format!("Place {id}"),
            "CREATED": 1_428_624_000_000_i64,
            "ELEV": 12.5
        },
        "geometry": { "x": -10.8, "y": 6.3 }
    })
}

/// Error object returned with HTTP 200, as ArcGIS does for bad queries.
#[must_use]
pub fn error_body(code: i64, message: &str) -> Value {
    json!({ "error": { "code": code, "message": message, "details": [] } })
}
