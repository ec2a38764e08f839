use serde_json::{Map, Value};
use thiserror::Error;

/// Raw `{type, coordinates}` pair as found in the file.
///
/// Kept untyped so unknown or malformed geometries never reject the feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub kind: String,
    pub coordinates: Value,
}

impl Geometry {
    pub fn point(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: Value::Array(vec![Value::from(lon_deg), Value::from(lat_deg)]),
        }
    }

    /// Every number in `coordinates`, depth-first.
    pub fn flat_coordinates(&self) -> Vec<f64> {
        fn walk(v: &Value, out: &mut Vec<f64>) {
            match v {
                Value::Number(n) => out.extend(n.as_f64()),
                Value::Array(items) => items.iter().for_each(|i| walk(i, out)),
                _ => {}
            }
        }
        let mut out = Vec::new();
        walk(&self.coordinates, &mut out);
        out
    }

    fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), Value::String(self.kind.clone()));
        obj.insert("coordinates".to_string(), self.coordinates.clone());
        Value::Object(obj)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feature {
    pub id: Option<String>,
    pub geometry: Option<Geometry>,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key).filter(|v| !v.is_null())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Debug, Error)]
pub enum GeoJsonError {
    #[error("malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("expected a GeoJSON FeatureCollection")]
    NotAFeatureCollection,
}

impl FeatureCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn from_geojson_str(payload: &str) -> Result<Self, GeoJsonError> {
        let value: Value = serde_json::from_str(payload)?;
        Self::from_geojson_value(value)
    }

    /// Accepts a `FeatureCollection`, any object with a `features` array, or
    /// a lone `Feature`.
    ///
    /// Individual features are read leniently: a missing `properties` becomes
    /// an empty map and a missing or shapeless `geometry` becomes `None`.
    pub fn from_geojson_value(value: Value) -> Result<Self, GeoJsonError> {
        let obj = value
            .as_object()
            .ok_or(GeoJsonError::NotAFeatureCollection)?;

        if let Some(features_val) = obj.get("features").and_then(|v| v.as_array()) {
            let features = features_val.iter().map(parse_feature).collect();
            return Ok(Self { features });
        }

        match obj.get("type").and_then(|v| v.as_str()) {
            Some("Feature") => Ok(Self {
                features: vec![parse_feature(&value)],
            }),
            _ => Err(GeoJsonError::NotAFeatureCollection),
        }
    }

    /// Emits a GeoJSON FeatureCollection holding the features at `indices`.
    pub fn subset_to_geojson_value(&self, indices: &[usize]) -> Value {
        let features = indices
            .iter()
            .filter_map(|&i| self.features.get(i))
            .map(feature_to_value)
            .collect();

        let mut root = Map::new();
        root.insert(
            "type".to_string(),
            Value::String("FeatureCollection".to_string()),
        );
        root.insert("features".to_string(), Value::Array(features));
        Value::Object(root)
    }
}

fn parse_feature(value: &Value) -> Feature {
    let Some(feat_obj) = value.as_object() else {
        tracing::debug!("non-object feature kept as empty");
        return Feature::default();
    };

    let id = match feat_obj.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    let properties = feat_obj
        .get("properties")
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();

    let geometry = feat_obj
        .get("geometry")
        .and_then(|v| v.as_object())
        .and_then(|g| {
            let kind = g.get("type")?.as_str()?.to_string();
            let coordinates = g.get("coordinates").cloned().unwrap_or(Value::Null);
            Some(Geometry { kind, coordinates })
        });

    Feature {
        id,
        geometry,
        properties,
    }
}

fn feature_to_value(feat: &Feature) -> Value {
    let mut fobj = Map::new();
    fobj.insert("type".to_string(), Value::String("Feature".to_string()));
    if let Some(id) = &feat.id {
        fobj.insert("id".to_string(), Value::String(id.clone()));
    }
    fobj.insert(
        "properties".to_string(),
        Value::Object(feat.properties.clone()),
    );
    fobj.insert(
        "geometry".to_string(),
        feat.geometry
            .as_ref()
            .map(Geometry::to_value)
            .unwrap_or(Value::Null),
    );
    Value::Object(fobj)
}

#[cfg(test)]
mod tests {
    use super::{FeatureCollection, GeoJsonError, Geometry};
    use serde_json::json;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "id": 7,
             "geometry": {"type": "Point", "coordinates": [13.4, 52.5]},
             "properties": {"tags": ["city", "capital"], "timestamp": "2024-01-01"}},
            {"type": "Feature",
             "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}},
            {"type": "Feature", "properties": {"tags": "orphan"}}
        ]
    }"#;

    #[test]
    fn parses_collection_leniently() {
        let fc = FeatureCollection::from_geojson_str(SAMPLE).unwrap();
        assert_eq!(fc.len(), 3);
        assert_eq!(fc.features[0].id.as_deref(), Some("7"));
        assert_eq!(
            fc.features[0].geometry.as_ref(),
            Some(&Geometry::point(13.4, 52.5))
        );
        assert!(fc.features[1].properties.is_empty());
        assert!(fc.features[2].geometry.is_none());
    }

    #[test]
    fn accepts_single_feature() {
        let fc = FeatureCollection::from_geojson_str(
            r#"{"type": "Feature", "geometry": {"type": "Point", "coordinates": [1, 2]}}"#,
        )
        .unwrap();
        assert_eq!(fc.len(), 1);
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            FeatureCollection::from_geojson_str("{not json"),
            Err(GeoJsonError::Malformed(_))
        ));
        assert!(matches!(
            FeatureCollection::from_geojson_str("[1, 2]"),
            Err(GeoJsonError::NotAFeatureCollection)
        ));
    }

    #[test]
    fn unknown_geometry_is_kept_raw() {
        let fc = FeatureCollection::from_geojson_value(json!({
            "features": [{"geometry": {"type": "Circle", "coordinates": [1, 2, 3]}}]
        }))
        .unwrap();
        let geom = fc.features[0].geometry.as_ref().unwrap();
        assert_eq!(geom.kind, "Circle");
        assert_eq!(geom.flat_coordinates(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn subset_export_keeps_order() {
        let fc = FeatureCollection::from_geojson_str(SAMPLE).unwrap();
        let out = fc.subset_to_geojson_value(&[2, 0]);
        let features = out["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["properties"]["tags"], json!("orphan"));
        assert_eq!(features[0]["geometry"], json!(null));
        assert_eq!(features[1]["id"], json!("7"));
        assert_eq!(features[1]["geometry"]["type"], json!("Point"));
    }
}
