//! Image payloads and the sizing parameters sent alongside a generation request.
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Output resolution understood by the image model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "1K")]
    Res1K,
    #[serde(rename = "2K")]
    Res2K,
    #[default]
    #[serde(rename = "4K")]
    Res4K,
}

impl Resolution {
    pub const ALL: [Resolution; 3] = [Self::Res1K, Self::Res2K, Self::Res4K];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Res1K => "1K",
            Self::Res2K => "2K",
            Self::Res4K => "4K",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown resolution '{}'", s))
    }
}

/// Aspect ratios accepted by the image model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "2:3")]
    Portrait2x3,
    #[serde(rename = "3:2")]
    Landscape3x2,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[default]
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "16:9")]
    Landscape16x9,
    #[serde(rename = "21:9")]
    Cinematic21x9,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 8] = [
        Self::Square,
        Self::Portrait2x3,
        Self::Landscape3x2,
        Self::Portrait3x4,
        Self::Landscape4x3,
        Self::Portrait9x16,
        Self::Landscape16x9,
        Self::Cinematic21x9,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait2x3 => "2:3",
            Self::Landscape3x2 => "3:2",
            Self::Portrait3x4 => "3:4",
            Self::Landscape4x3 => "4:3",
            Self::Portrait9x16 => "9:16",
            Self::Landscape16x9 => "16:9",
            Self::Cinematic21x9 => "21:9",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown aspect ratio '{}'", s))
    }
}

/// Maps a MIME type onto a file extension for saved images.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

/// Sniffs PNG / JPEG / WebP magic bytes.
pub fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// The photo a user uploaded.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Preview reference; regenerated on every upload.
    pub id: Uuid,
    pub data: Vec<u8>,
    pub mime_type: String,
    pub file_name: Option<String>,
}

impl SourceImage {
    /// Wraps uploaded bytes. When the declared MIME type is missing or generic
    /// the magic bytes decide, falling back to PNG.
    pub fn new(data: Vec<u8>, mime_type: Option<&str>, file_name: Option<String>) -> Self {
        let declared = mime_type
            .map(|m| m.split(';').next().unwrap_or(m).trim().to_ascii_lowercase())
            .filter(|m| m.starts_with("image/"));
        let mime_type = declared
            .or_else(|| sniff_mime(&data).map(str::to_string))
            .unwrap_or_else(|| "image/png".to_string());
        Self {
            id: Uuid::new_v4(),
            data,
            mime_type,
            file_name,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

/// An image returned by the generation service.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub id: Uuid,
    pub data: Vec<u8>,
    pub mime_type: String,
    pub model: Option<String>,
}

impl GeneratedImage {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>, model: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            data,
            mime_type: mime_type.into(),
            model,
        }
    }

    pub fn extension(&self) -> &'static str {
        extension_for_mime(&self.mime_type)
    }

    /// Renders the image as a `data:` URL, the locator handed to clients.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_original_session() {
        assert_eq!(Resolution::default(), Resolution::Res4K);
        assert_eq!(AspectRatio::default(), AspectRatio::Portrait9x16);
    }

    #[test]
    fn aspect_ratio_parses_every_display_value() {
        for ratio in AspectRatio::ALL {
            assert_eq!(ratio.as_str().parse::<AspectRatio>(), Ok(ratio));
        }
        assert!("5:4".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn resolution_parse_is_case_insensitive() {
        assert_eq!("2k".parse::<Resolution>(), Ok(Resolution::Res2K));
        assert!("8K".parse::<Resolution>().is_err());
    }

    #[test]
    fn enums_serialize_as_wire_strings() {
        assert_eq!(serde_json::to_string(&Resolution::Res4K).unwrap(), "\"4K\"");
        assert_eq!(
            serde_json::to_string(&AspectRatio::Cinematic21x9).unwrap(),
            "\"21:9\""
        );
    }

    #[test]
    fn source_image_sniffs_when_mime_is_generic() {
        let jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0, 0];
        let img = SourceImage::new(jpeg, Some("application/octet-stream"), None);
        assert_eq!(img.mime_type, "image/jpeg");

        let declared = SourceImage::new(vec![1, 2, 3], Some("image/webp; charset=binary"), None);
        assert_eq!(declared.mime_type, "image/webp");
    }

    #[test]
    fn generated_image_data_url() {
        let img = GeneratedImage::new(vec![1, 2, 3], "image/png", None);
        assert_eq!(img.to_data_url(), "data:image/png;base64,AQID");
        assert_eq!(img.extension(), "png");
    }
}
