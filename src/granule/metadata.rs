use std::collections::HashMap;

use chrono::DateTime;
use serde_json::Value;

use crate::granule::id::{GranuleId, ParseError};

/// Metadata for one granule, merged from the parsed identifier and the
/// search-result attributes (CMR `meta` and UMM-G `umm` objects).
///
/// Only the granule UR and the beginning timestamp are required; every other
/// attribute falls back to an empty sentinel so a sparse search result still
/// yields a usable record.
#[derive(Debug, Clone)]
pub struct GranuleRecord {
    pub id: GranuleId,
    pub granule_ur: String,

    // CMR meta identifiers
    pub concept_type: String,
    pub concept_id: String,
    pub revision_id: String,
    pub native_id: String,
    pub collection_concept_id: String,
    pub provider_id: String,
    pub format: String,
    pub revision_date: String,

    // Collection and processing provenance
    pub short_name: String,
    pub collection_version: String,
    pub pge_version: String,

    // Temporal coverage
    pub beginning_date_time: String,
    pub ending_date_time: String,
    pub time_start: Option<i64>,
    pub time_end: Option<i64>,

    // Spatial coverage
    pub north_lat: Option<f64>,
    pub south_lat: Option<f64>,
    pub east_lon: Option<f64>,
    pub west_lon: Option<f64>,

    pub provider_date_insert: String,
    pub provider_date_update: String,

    pub day_night_flag: String,
    pub production_date_time: String,
    pub platform_short_name: String,
    pub sensor: String,
    pub size_mb: f64,
    pub cloud_cover: Option<f64>,

    pub orbit_number: String,
    pub begin_orbit_number: String,
    pub end_orbit_number: String,

    pub parameter_names: String,

    /// Additional attributes flattened to `attr_<name>` pairs.
    pub additional: Vec<(String, String)>,
}

fn str_field(obj: &Value, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn opt_f64(obj: &Value, key: &str) -> Option<f64> {
    match obj.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}

fn epoch_ms(stamp: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(stamp)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

impl GranuleRecord {
    /// Build a record from a search hit's `meta` and `umm` objects.
    ///
    /// Fails when the granule UR is absent or does not parse, or when the
    /// beginning timestamp is missing. Everything else is optional.
    pub fn from_umm(meta: &Value, umm: &Value) -> Result<Self, ParseError> {
        let granule_ur = str_field(umm, "GranuleUR");
        if granule_ur.is_empty() {
            return Err(ParseError::MissingAttribute("GranuleUR"));
        }
        let id: GranuleId = granule_ur.parse()?;

        let temporal = &umm["TemporalExtent"]["RangeDateTime"];
        let beginning_date_time = str_field(temporal, "BeginningDateTime");
        if beginning_date_time.is_empty() {
            return Err(ParseError::MissingAttribute("BeginningDateTime"));
        }
        let ending_date_time = str_field(temporal, "EndingDateTime");
        let time_start = epoch_ms(&beginning_date_time);
        let time_end = epoch_ms(&ending_date_time).or(time_start);

        let collection = &umm["CollectionReference"];

        let rect = &umm["SpatialExtent"]["HorizontalSpatialDomain"]["Geometry"]
            ["BoundingRectangles"][0];

        let mut provider_date_insert = String::new();
        let mut provider_date_update = String::new();
        if let Some(dates) = umm["ProviderDates"].as_array() {
            for pdate in dates {
                match pdate["Type"].as_str() {
                    Some("Insert") => provider_date_insert = str_field(pdate, "Date"),
                    Some("Update") => provider_date_update = str_field(pdate, "Date"),
                    _ => {}
                }
            }
        }

        let data_granule = &umm["DataGranule"];
        let size_mb = data_granule["ArchiveAndDistributionInformation"]
            .as_array()
            .map(|infos| infos.iter().filter_map(|info| opt_f64(info, "Size")).sum())
            .unwrap_or(0.0);

        let mut platform_short_name = String::new();
        let mut sensor = String::new();
        if let Some(platform) = umm["Platforms"].get(0) {
            platform_short_name = platform
                .get("ShortName")
                .and_then(Value::as_str)
                .unwrap_or("ISS")
                .to_string();
            if let Some(instrument) = platform["Instruments"].get(0) {
                sensor = instrument
                    .get("ShortName")
                    .and_then(Value::as_str)
                    .unwrap_or("ECOSTRESS")
                    .to_string();
            }
        }

        let mut orbit_number = String::new();
        let mut begin_orbit_number = String::new();
        let mut end_orbit_number = String::new();
        if let Some(domain) = umm["OrbitCalculatedSpatialDomains"].get(0) {
            if domain.get("BeginOrbitNumber").is_some() {
                begin_orbit_number = str_field(domain, "BeginOrbitNumber");
                end_orbit_number = str_field(domain, "EndOrbitNumber");
                orbit_number = begin_orbit_number.clone();
            }
        }
        if orbit_number.is_empty() {
            if let Some(params) = umm["OrbitParameters"].get(0) {
                orbit_number = str_field(params, "OrbitNumber");
            }
        }

        let parameter_names = umm["MeasuredParameters"]
            .as_array()
            .map(|params| {
                params
                    .iter()
                    .filter_map(|p| p["ParameterName"].as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();

        let mut additional = Vec::new();
        if let Some(attrs) = umm["AdditionalAttributes"].as_array() {
            for attr in attrs {
                let name = attr["Name"].as_str().unwrap_or("");
                if name.is_empty() {
                    continue;
                }
                let values: Vec<&str> = attr["Values"]
                    .as_array()
                    .map(|vs| vs.iter().filter_map(Value::as_str).collect())
                    .unwrap_or_default();
                if values.is_empty() {
                    continue;
                }
                let key = format!("attr_{}", name.to_lowercase().replace('-', "_"));
                additional.push((key, values.join(", ")));
            }
        }

        Ok(GranuleRecord {
            granule_ur,
            id,

            concept_type: str_field(meta, "concept-type"),
            concept_id: str_field(meta, "concept-id"),
            revision_id: str_field(meta, "revision-id"),
            native_id: str_field(meta, "native-id"),
            collection_concept_id: str_field(meta, "collection-concept-id"),
            provider_id: str_field(meta, "provider-id"),
            format: str_field(meta, "format"),
            revision_date: str_field(meta, "revision-date"),

            short_name: str_field(collection, "ShortName"),
            collection_version: str_field(collection, "Version"),
            pge_version: str_field(&umm["PGEVersionClass"], "PGEVersion"),

            beginning_date_time,
            ending_date_time,
            time_start,
            time_end,

            north_lat: opt_f64(rect, "NorthBoundingCoordinate"),
            south_lat: opt_f64(rect, "SouthBoundingCoordinate"),
            east_lon: opt_f64(rect, "EastBoundingCoordinate"),
            west_lon: opt_f64(rect, "WestBoundingCoordinate"),

            provider_date_insert,
            provider_date_update,

            day_night_flag: str_field(data_granule, "DayNightFlag"),
            production_date_time: str_field(data_granule, "ProductionDateTime"),
            platform_short_name,
            sensor,
            size_mb,
            cloud_cover: opt_f64(umm, "CloudCover"),

            orbit_number,
            begin_orbit_number,
            end_orbit_number,

            parameter_names,
            additional,
        })
    }

    /// Flatten the record into manifest field names and string values.
    ///
    /// Optional attributes without a value are omitted so callers can
    /// distinguish "absent" from "empty".
    pub fn to_fields(&self) -> HashMap<String, String> {
        let mut fields = HashMap::new();

        fields.insert("granule_ur".to_string(), self.granule_ur.clone());
        fields.insert("concept_type".to_string(), self.concept_type.clone());
        fields.insert("concept_id".to_string(), self.concept_id.clone());
        fields.insert("revision_id".to_string(), self.revision_id.clone());
        fields.insert("native_id".to_string(), self.native_id.clone());
        fields.insert(
            "collection_concept_id".to_string(),
            self.collection_concept_id.clone(),
        );
        fields.insert("provider_id".to_string(), self.provider_id.clone());
        fields.insert("format".to_string(), self.format.clone());
        fields.insert("revision_date".to_string(), self.revision_date.clone());

        // Fields carried by the filename itself
        fields.insert("processing_ID".to_string(), self.id.processing_id());
        fields.insert("mgrs_tile".to_string(), self.id.tile.clone());
        fields.insert(
            "orbit_number_from_filename".to_string(),
            format!("{:05}", self.id.orbit),
        );
        fields.insert(
            "version_from_filename".to_string(),
            format!("{:03}", self.id.version),
        );
        fields.insert("processing_level".to_string(), self.id.level.clone());
        fields.insert("scene".to_string(), self.id.scene.to_string());
        fields.insert("orbit_scene".to_string(), self.id.orbit_scene());

        fields.insert("short_name".to_string(), self.short_name.clone());
        fields.insert("version".to_string(), self.collection_version.clone());
        fields.insert("pge_version".to_string(), self.pge_version.clone());

        fields.insert(
            "beginning_date_time".to_string(),
            self.beginning_date_time.clone(),
        );
        fields.insert(
            "ending_date_time".to_string(),
            self.ending_date_time.clone(),
        );
        if let Some(ms) = self.time_start {
            fields.insert("time_start".to_string(), ms.to_string());
        }

        if let Some(v) = self.north_lat {
            fields.insert("north_lat".to_string(), v.to_string());
        }
        if let Some(v) = self.south_lat {
            fields.insert("south_lat".to_string(), v.to_string());
        }
        if let Some(v) = self.east_lon {
            fields.insert("east_lon".to_string(), v.to_string());
        }
        if let Some(v) = self.west_lon {
            fields.insert("west_lon".to_string(), v.to_string());
        }

        fields.insert(
            "provider_date_insert".to_string(),
            self.provider_date_insert.clone(),
        );
        fields.insert(
            "provider_date_update".to_string(),
            self.provider_date_update.clone(),
        );

        fields.insert("day_night_flag".to_string(), self.day_night_flag.clone());
        fields.insert(
            "production_date_time".to_string(),
            self.production_date_time.clone(),
        );
        fields.insert(
            "platform_short_name".to_string(),
            self.platform_short_name.clone(),
        );
        fields.insert("sensor".to_string(), self.sensor.clone());
        fields.insert("size_mb".to_string(), self.size_mb.to_string());
        if let Some(v) = self.cloud_cover {
            fields.insert("cloud_cover".to_string(), v.to_string());
        }

        fields.insert("orbit_number".to_string(), self.orbit_number.clone());
        fields.insert(
            "begin_orbit_number".to_string(),
            self.begin_orbit_number.clone(),
        );
        fields.insert(
            "end_orbit_number".to_string(),
            self.end_orbit_number.clone(),
        );

        fields.insert("parameter_names".to_string(), self.parameter_names.clone());

        for (key, value) in &self.additional {
            fields.insert(key.clone(), value.clone());
        }

        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_meta() -> Value {
        json!({
            "concept-type": "granule",
            "concept-id": "G3456789012-LPCLOUD",
            "revision-id": 1,
            "native-id": "ECOv002_L2T_LSTE_35800_011_18TUN_20250115T062258_0712_01",
            "collection-concept-id": "C2076090826-LPCLOUD",
            "provider-id": "LPCLOUD",
            "format": "application/echo10+xml",
            "revision-date": "2025-01-16T10:00:00.000Z"
        })
    }

    fn sample_umm() -> Value {
        json!({
            "GranuleUR": "ECOv002_L2T_LSTE_35800_011_18TUN_20250115T062258_0712_01",
            "CollectionReference": { "ShortName": "ECO_L2T_LSTE", "Version": "002" },
            "PGEVersionClass": { "PGEVersion": "1.3.1" },
            "TemporalExtent": {
                "RangeDateTime": {
                    "BeginningDateTime": "2025-01-15T06:22:58Z",
                    "EndingDateTime": "2025-01-15T06:23:50Z"
                }
            },
            "SpatialExtent": {
                "HorizontalSpatialDomain": {
                    "Geometry": {
                        "BoundingRectangles": [{
                            "NorthBoundingCoordinate": 41.049,
                            "SouthBoundingCoordinate": 40.036,
                            "EastBoundingCoordinate": -74.65,
                            "WestBoundingCoordinate": -75.97
                        }]
                    }
                }
            },
            "ProviderDates": [
                { "Type": "Insert", "Date": "2025-01-16T01:00:00.000Z" },
                { "Type": "Update", "Date": "2025-01-17T01:00:00.000Z" }
            ],
            "DataGranule": {
                "DayNightFlag": "Day",
                "ProductionDateTime": "2025-01-15T20:11:32.000Z",
                "ArchiveAndDistributionInformation": [
                    { "Name": "LST.tif", "Size": 2.5, "SizeUnit": "MB" },
                    { "Name": "QC.tif", "Size": 1.5, "SizeUnit": "MB" }
                ]
            },
            "Platforms": [{
                "ShortName": "ISS",
                "Instruments": [{ "ShortName": "ECOSTRESS" }]
            }],
            "OrbitCalculatedSpatialDomains": [
                { "BeginOrbitNumber": 35800, "EndOrbitNumber": 35800 }
            ],
            "MeasuredParameters": [
                { "ParameterName": "Land Surface Temperature" },
                { "ParameterName": "Emissivity" }
            ],
            "AdditionalAttributes": [
                { "Name": "Identifier_product_DOI", "Values": ["10.5067/ECOSTRESS/ECO_L2T_LSTE.002"] },
                { "Name": "Identifier_product_DOI_Authority", "Values": ["https://doi.org"] }
            ],
            "CloudCover": 12.0
        })
    }

    #[test]
    fn test_from_umm_extracts_all_sections() {
        let record = GranuleRecord::from_umm(&sample_meta(), &sample_umm()).unwrap();

        assert_eq!(record.id.tile, "18TUN");
        assert_eq!(record.concept_id, "G3456789012-LPCLOUD");
        assert_eq!(record.revision_id, "1");
        assert_eq!(record.short_name, "ECO_L2T_LSTE");
        assert_eq!(record.collection_version, "002");
        assert_eq!(record.pge_version, "1.3.1");
        assert_eq!(record.beginning_date_time, "2025-01-15T06:22:58Z");
        assert_eq!(record.time_start, Some(1_736_922_178_000));
        assert_eq!(record.time_end, Some(1_736_922_230_000));
        assert_eq!(record.north_lat, Some(41.049));
        assert_eq!(record.west_lon, Some(-75.97));
        assert_eq!(record.provider_date_insert, "2025-01-16T01:00:00.000Z");
        assert_eq!(record.provider_date_update, "2025-01-17T01:00:00.000Z");
        assert_eq!(record.day_night_flag, "Day");
        assert_eq!(record.platform_short_name, "ISS");
        assert_eq!(record.sensor, "ECOSTRESS");
        assert_eq!(record.size_mb, 4.0);
        assert_eq!(record.cloud_cover, Some(12.0));
        assert_eq!(record.orbit_number, "35800");
        assert_eq!(record.begin_orbit_number, "35800");
        assert_eq!(
            record.parameter_names,
            "Land Surface Temperature, Emissivity"
        );
        assert_eq!(
            record.additional[0],
            (
                "attr_identifier_product_doi".to_string(),
                "10.5067/ECOSTRESS/ECO_L2T_LSTE.002".to_string()
            )
        );
    }

    #[test]
    fn test_to_fields_filename_derived_values() {
        let record = GranuleRecord::from_umm(&sample_meta(), &sample_umm()).unwrap();
        let fields = record.to_fields();

        assert_eq!(fields["processing_ID"], "0712_01");
        assert_eq!(fields["mgrs_tile"], "18TUN");
        assert_eq!(fields["orbit_number_from_filename"], "35800");
        assert_eq!(fields["version_from_filename"], "002");
        assert_eq!(fields["processing_level"], "L2T");
        assert_eq!(fields["scene"], "11");
        assert_eq!(fields["orbit_scene"], "35800_011");
        assert_eq!(fields["time_start"], "1736922178000");
        assert_eq!(fields["size_mb"], "4");
    }

    #[test]
    fn test_missing_granule_ur_is_rejected() {
        let mut umm = sample_umm();
        umm.as_object_mut().unwrap().remove("GranuleUR");
        assert_eq!(
            GranuleRecord::from_umm(&sample_meta(), &umm).unwrap_err(),
            ParseError::MissingAttribute("GranuleUR")
        );
    }

    #[test]
    fn test_missing_beginning_datetime_is_rejected() {
        let mut umm = sample_umm();
        umm.as_object_mut().unwrap().remove("TemporalExtent");
        assert_eq!(
            GranuleRecord::from_umm(&sample_meta(), &umm).unwrap_err(),
            ParseError::MissingAttribute("BeginningDateTime")
        );
    }

    #[test]
    fn test_unparseable_granule_ur_propagates() {
        let mut umm = sample_umm();
        umm["GranuleUR"] = json!("SOMETHING_ELSE_ENTIRELY");
        assert!(matches!(
            GranuleRecord::from_umm(&sample_meta(), &umm),
            Err(ParseError::Layout(_))
        ));
    }

    #[test]
    fn test_sparse_umm_uses_empty_sentinels() {
        let umm = json!({
            "GranuleUR": "ECOv002_L2T_LSTE_35800_011_18TUN_20250115T062258_0712_01",
            "TemporalExtent": {
                "RangeDateTime": { "BeginningDateTime": "2025-01-15T06:22:58Z" }
            }
        });
        let record = GranuleRecord::from_umm(&json!({}), &umm).unwrap();

        assert_eq!(record.ending_date_time, "");
        // With no ending timestamp the end of coverage collapses to the start.
        assert_eq!(record.time_end, record.time_start);
        assert_eq!(record.north_lat, None);
        assert_eq!(record.platform_short_name, "");
        assert_eq!(record.sensor, "");
        assert_eq!(record.size_mb, 0.0);
        assert_eq!(record.orbit_number, "");
        assert_eq!(record.parameter_names, "");
        assert!(record.additional.is_empty());

        let fields = record.to_fields();
        assert!(!fields.contains_key("north_lat"));
        assert_eq!(fields["ending_date_time"], "");
    }

    #[test]
    fn test_platform_defaults_when_short_name_missing() {
        let mut umm = sample_umm();
        umm["Platforms"] = json!([{ "Instruments": [{}] }]);
        let record = GranuleRecord::from_umm(&sample_meta(), &umm).unwrap();
        assert_eq!(record.platform_short_name, "ISS");
        assert_eq!(record.sensor, "ECOSTRESS");
    }

    #[test]
    fn test_orbit_number_falls_back_to_orbit_parameters() {
        let mut umm = sample_umm();
        umm.as_object_mut()
            .unwrap()
            .remove("OrbitCalculatedSpatialDomains");
        umm["OrbitParameters"] = json!([{ "OrbitNumber": 35801 }]);
        let record = GranuleRecord::from_umm(&sample_meta(), &umm).unwrap();
        assert_eq!(record.orbit_number, "35801");
        assert_eq!(record.begin_orbit_number, "");
    }
}
