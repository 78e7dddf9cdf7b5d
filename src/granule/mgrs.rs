use thiserror::Error;

/// Errors for malformed MGRS tile codes
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidTileError {
    #[error("tile code must be 5 characters (zone + band + square), got: {0}")]
    Length(String),
    #[error("UTM zone out of range 1-60: {0}")]
    Zone(String),
    #[error("invalid latitude band letter: {0}")]
    Band(char),
    #[error("invalid grid square letters: {0}")]
    Square(String),
}

// Latitude bands run C..X south to north, skipping I and O.
// N and above lie in the northern hemisphere.
fn is_band_letter(c: char) -> bool {
    ('C'..='X').contains(&c) && c != 'I' && c != 'O'
}

/// Resolve an MGRS tile code to its UTM EPSG code.
///
/// Northern-hemisphere tiles map to `32600 + zone`, southern to
/// `32700 + zone`: `"18TUN"` resolves to `32618`.
pub fn utm_epsg(tile: &str) -> Result<u32, InvalidTileError> {
    let chars: Vec<char> = tile.chars().collect();
    if chars.len() != 5 {
        return Err(InvalidTileError::Length(tile.to_string()));
    }

    if !chars[0].is_ascii_digit() || !chars[1].is_ascii_digit() {
        return Err(InvalidTileError::Zone(chars[..2].iter().collect()));
    }
    let zone = (chars[0] as u32 - '0' as u32) * 10 + (chars[1] as u32 - '0' as u32);
    if !(1..=60).contains(&zone) {
        return Err(InvalidTileError::Zone(chars[..2].iter().collect()));
    }

    let band = chars[2];
    if !is_band_letter(band) {
        return Err(InvalidTileError::Band(band));
    }

    if !chars[3].is_ascii_uppercase() || !chars[4].is_ascii_uppercase() {
        return Err(InvalidTileError::Square(chars[3..].iter().collect()));
    }

    if band >= 'N' {
        Ok(32600 + zone)
    } else {
        Ok(32700 + zone)
    }
}

/// Render the EPSG code in the manifest's column form, e.g. `"EPSG32618"`.
pub fn epsg_label(tile: &str) -> Result<String, InvalidTileError> {
    Ok(format!("EPSG{}", utm_epsg(tile)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_northern_tile_resolves_to_326xx() {
        assert_eq!(utm_epsg("18TUN").unwrap(), 32618);
        assert_eq!(utm_epsg("10SFH").unwrap(), 32610);
        assert_eq!(utm_epsg("60XWA").unwrap(), 32660);
    }

    #[test]
    fn test_southern_tile_resolves_to_327xx() {
        assert_eq!(utm_epsg("19FGE").unwrap(), 32719);
        assert_eq!(utm_epsg("01CAB").unwrap(), 32701);
        assert_eq!(utm_epsg("33MVS").unwrap(), 32733);
    }

    #[test]
    fn test_hemisphere_boundary_bands() {
        // M is the northernmost southern band, N the southernmost northern
        assert_eq!(utm_epsg("18MUN").unwrap(), 32718);
        assert_eq!(utm_epsg("18NUN").unwrap(), 32618);
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert_eq!(
            utm_epsg("18T"),
            Err(InvalidTileError::Length("18T".to_string()))
        );
        assert_eq!(
            utm_epsg("18TUNX"),
            Err(InvalidTileError::Length("18TUNX".to_string()))
        );
        assert_eq!(utm_epsg(""), Err(InvalidTileError::Length(String::new())));
    }

    #[test]
    fn test_out_of_range_zone_rejected() {
        assert_eq!(
            utm_epsg("00TUN"),
            Err(InvalidTileError::Zone("00".to_string()))
        );
        assert_eq!(
            utm_epsg("61TUN"),
            Err(InvalidTileError::Zone("61".to_string()))
        );
        assert_eq!(
            utm_epsg("A8TUN"),
            Err(InvalidTileError::Zone("A8".to_string()))
        );
    }

    #[test]
    fn test_invalid_band_letter_rejected() {
        assert_eq!(utm_epsg("18IUN"), Err(InvalidTileError::Band('I')));
        assert_eq!(utm_epsg("18OUN"), Err(InvalidTileError::Band('O')));
        assert_eq!(utm_epsg("18AUN"), Err(InvalidTileError::Band('A')));
        assert_eq!(utm_epsg("18ZUN"), Err(InvalidTileError::Band('Z')));
        assert_eq!(utm_epsg("18tUN"), Err(InvalidTileError::Band('t')));
    }

    #[test]
    fn test_invalid_square_letters_rejected() {
        assert_eq!(
            utm_epsg("18Tu1"),
            Err(InvalidTileError::Square("u1".to_string()))
        );
    }

    #[test]
    fn test_label_mirrors_code() {
        assert_eq!(epsg_label("18TUN").unwrap(), "EPSG32618");
        assert_eq!(epsg_label("19FGE").unwrap(), "EPSG32719");
        assert!(epsg_label("bogus").is_err());
    }
}
