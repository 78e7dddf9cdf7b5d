use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors encountered when parsing granule identifiers
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unrecognized granule identifier layout: {0}")]
    Layout(String),
    #[error("invalid {field} field in granule identifier: {value}")]
    Field { field: &'static str, value: String },
    #[error("invalid acquisition timestamp: {0}")]
    Timestamp(String),
    #[error("search result missing required attribute: {0}")]
    MissingAttribute(&'static str),
}

/// A parsed ECOSTRESS tiled-granule identifier.
///
/// Identifiers have the form
/// `ECOv002_L2T_LSTE_35800_011_18TUN_20250115T062258_0712_01[_LST][.tif]`:
/// product version, processing level, product name, orbit, scene, MGRS tile,
/// acquisition timestamp, build, iteration, then an optional band suffix
/// (which may itself contain underscores, e.g. `LST_err`) and extension.
///
/// Numeric fields carry fixed widths, so rendering a parsed identifier with
/// [`std::fmt::Display`] reproduces the original string exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GranuleId {
    pub version: u16,
    pub level: String,
    pub product: String,
    pub orbit: u32,
    pub scene: u16,
    pub tile: String,
    pub acquired: NaiveDateTime,
    pub build: u16,
    pub iteration: u8,
    pub band: Option<String>,
    pub extension: Option<String>,
}

fn fixed_digits(field: &'static str, s: &str, width: usize) -> Result<u32, ParseError> {
    if s.len() != width || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::Field {
            field,
            value: s.to_string(),
        });
    }
    s.parse().map_err(|_| ParseError::Field {
        field,
        value: s.to_string(),
    })
}

impl std::str::FromStr for GranuleId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, ParseError> {
        let (stem, extension) = match s.strip_suffix(".tif") {
            Some(stem) => (stem, Some("tif".to_string())),
            None => (s, None),
        };

        let parts: Vec<&str> = stem.split('_').collect();
        if parts.len() < 9 {
            return Err(ParseError::Layout(s.to_string()));
        }

        let version_digits = parts[0]
            .strip_prefix("ECOv")
            .ok_or_else(|| ParseError::Layout(s.to_string()))?;
        let version = fixed_digits("version", version_digits, 3)? as u16;

        let level = parts[1];
        let level_ok = level.len() >= 2
            && level.starts_with('L')
            && level.as_bytes()[1].is_ascii_digit()
            && level.bytes().all(|b| b.is_ascii_alphanumeric());
        if !level_ok {
            return Err(ParseError::Field {
                field: "level",
                value: level.to_string(),
            });
        }

        let product = parts[2];
        if product.is_empty() || !product.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(ParseError::Field {
                field: "product",
                value: product.to_string(),
            });
        }

        let orbit = fixed_digits("orbit", parts[3], 5)?;
        let scene = fixed_digits("scene", parts[4], 3)? as u16;

        let tile = parts[5];
        let tb = tile.as_bytes();
        let tile_ok = tb.len() == 5
            && tb[0].is_ascii_digit()
            && tb[1].is_ascii_digit()
            && tb[2..].iter().all(|b| b.is_ascii_uppercase());
        if !tile_ok {
            return Err(ParseError::Field {
                field: "tile",
                value: tile.to_string(),
            });
        }

        if parts[6].len() != 15 {
            return Err(ParseError::Timestamp(parts[6].to_string()));
        }
        let acquired = NaiveDateTime::parse_from_str(parts[6], "%Y%m%dT%H%M%S")
            .map_err(|_| ParseError::Timestamp(parts[6].to_string()))?;

        let build = fixed_digits("build", parts[7], 4)? as u16;
        let iteration = fixed_digits("iteration", parts[8], 2)? as u8;

        let band = if parts.len() > 9 {
            let segments = &parts[9..];
            if segments
                .iter()
                .any(|seg| seg.is_empty() || !seg.bytes().all(|b| b.is_ascii_alphanumeric()))
            {
                return Err(ParseError::Field {
                    field: "band",
                    value: segments.join("_"),
                });
            }
            Some(segments.join("_"))
        } else {
            None
        };

        Ok(GranuleId {
            version,
            level: level.to_string(),
            product: product.to_string(),
            orbit,
            scene,
            tile: tile.to_string(),
            acquired,
            build,
            iteration,
            band,
            extension,
        })
    }
}

impl std::fmt::Display for GranuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ECOv{:03}_{}_{}_{:05}_{:03}_{}_{}_{:04}_{:02}",
            self.version,
            self.level,
            self.product,
            self.orbit,
            self.scene,
            self.tile,
            self.acquired.format("%Y%m%dT%H%M%S"),
            self.build,
            self.iteration
        )?;
        if let Some(band) = &self.band {
            write!(f, "_{}", band)?;
        }
        if let Some(ext) = &self.extension {
            write!(f, ".{}", ext)?;
        }
        Ok(())
    }
}

impl GranuleId {
    /// Processing ID suffix in filename form, e.g. `"0712_01"`.
    pub fn processing_id(&self) -> String {
        format!("{:04}_{:02}", self.build, self.iteration)
    }

    /// Orbit/scene pair in filename form, e.g. `"35800_011"`.
    pub fn orbit_scene(&self) -> String {
        format!("{:05}_{:03}", self.orbit, self.scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const BAND_FILE: &str = "ECOv002_L2T_LSTE_35800_011_18TUN_20250115T062258_0712_01_LST.tif";
    const GRANULE_UR: &str = "ECOv002_L2T_LSTE_35800_011_18TUN_20250115T062258_0712_01";

    #[test]
    fn test_parse_band_filename_fields() {
        let id: GranuleId = BAND_FILE.parse().unwrap();
        assert_eq!(id.version, 2);
        assert_eq!(id.level, "L2T");
        assert_eq!(id.product, "LSTE");
        assert_eq!(id.orbit, 35800);
        assert_eq!(id.scene, 11);
        assert_eq!(id.tile, "18TUN");
        assert_eq!(
            id.acquired,
            NaiveDate::from_ymd_opt(2025, 1, 15)
                .unwrap()
                .and_hms_opt(6, 22, 58)
                .unwrap()
        );
        assert_eq!(id.build, 712);
        assert_eq!(id.iteration, 1);
        assert_eq!(id.band.as_deref(), Some("LST"));
        assert_eq!(id.extension.as_deref(), Some("tif"));
    }

    #[test]
    fn test_round_trip_band_filename() {
        let id: GranuleId = BAND_FILE.parse().unwrap();
        assert_eq!(id.to_string(), BAND_FILE);
    }

    #[test]
    fn test_round_trip_underscore_band() {
        let name = "ECOv002_L2T_LSTE_00048_003_19FGE_20240701T183012_0712_02_LST_err.tif";
        let id: GranuleId = name.parse().unwrap();
        assert_eq!(id.band.as_deref(), Some("LST_err"));
        assert_eq!(id.to_string(), name);
    }

    #[test]
    fn test_round_trip_granule_ur_without_band() {
        let id: GranuleId = GRANULE_UR.parse().unwrap();
        assert_eq!(id.band, None);
        assert_eq!(id.extension, None);
        assert_eq!(id.to_string(), GRANULE_UR);
    }

    #[test]
    fn test_round_trip_preserves_leading_zeros() {
        let name = "ECOv001_L2T_LSTE_00048_003_10SFH_20240101T000000_0601_00_QC.tif";
        let id: GranuleId = name.parse().unwrap();
        assert_eq!(id.orbit, 48);
        assert_eq!(id.scene, 3);
        assert_eq!(id.to_string(), name);
    }

    #[test]
    fn test_rejects_foreign_layout() {
        assert!(matches!(
            "random.tif".parse::<GranuleId>(),
            Err(ParseError::Layout(_))
        ));
        assert!(matches!(
            "S1A_IW_GRDH_1SDV_20250115T062258".parse::<GranuleId>(),
            Err(ParseError::Layout(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_field_widths() {
        // 6-digit orbit cannot re-render to the same string
        let six_digit_orbit = "ECOv002_L2T_LSTE_358000_011_18TUN_20250115T062258_0712_01_LST.tif";
        assert_eq!(
            six_digit_orbit.parse::<GranuleId>(),
            Err(ParseError::Field {
                field: "orbit",
                value: "358000".to_string()
            })
        );

        let two_digit_version = "ECOv02_L2T_LSTE_35800_011_18TUN_20250115T062258_0712_01";
        assert_eq!(
            two_digit_version.parse::<GranuleId>(),
            Err(ParseError::Field {
                field: "version",
                value: "02".to_string()
            })
        );
    }

    #[test]
    fn test_rejects_malformed_tile_and_timestamp() {
        let lowercase_tile = "ECOv002_L2T_LSTE_35800_011_18tun_20250115T062258_0712_01";
        assert!(matches!(
            lowercase_tile.parse::<GranuleId>(),
            Err(ParseError::Field { field: "tile", .. })
        ));

        let bad_stamp = "ECOv002_L2T_LSTE_35800_011_18TUN_20251315T062258_0712_01";
        assert_eq!(
            bad_stamp.parse::<GranuleId>(),
            Err(ParseError::Timestamp("20251315T062258".to_string()))
        );
    }

    #[test]
    fn test_rejects_empty_band_segment() {
        let trailing_underscore = "ECOv002_L2T_LSTE_35800_011_18TUN_20250115T062258_0712_01_";
        assert!(matches!(
            trailing_underscore.parse::<GranuleId>(),
            Err(ParseError::Field { field: "band", .. })
        ));
    }

    #[test]
    fn test_filename_form_helpers() {
        let id: GranuleId = BAND_FILE.parse().unwrap();
        assert_eq!(id.processing_id(), "0712_01");
        assert_eq!(id.orbit_scene(), "35800_011");
    }
}
