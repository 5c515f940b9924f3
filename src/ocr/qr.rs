//! QR decoding and the identity-card payload schema.
//!
//! Identity cards carry a QR code whose payload is a small XML element,
//! `<PrintLetterBarcodeData .../>`, with the holder's details as attributes.

use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use tracing::debug;

/// Errors from code decoding.
#[derive(Debug, Error)]
pub enum CodeError {
    #[error("No decodable code found")]
    NotFound,

    #[error("Invalid code payload: {0}")]
    InvalidPayload(String),

    #[error("Image error: {0}")]
    Image(String),
}

/// Decodes machine-readable 2D codes in an image.
pub trait CodeDecoder: Send + Sync {
    /// Return the payload of the first decodable code in the image.
    fn decode(&self, image: &Path) -> Result<String, CodeError>;
}

/// QR decoder backed by `rqrr`.
#[derive(Debug, Default, Clone, Copy)]
pub struct QrDecoder;

impl CodeDecoder for QrDecoder {
    fn decode(&self, image: &Path) -> Result<String, CodeError> {
        let img = image::open(image)
            .map_err(|e| CodeError::Image(e.to_string()))?
            .to_luma8();
        let (width, height) = img.dimensions();

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            width as usize,
            height as usize,
            |x, y| img.get_pixel(x as u32, y as u32).0[0],
        );

        let grids = prepared.detect_grids();
        debug!("{}: {} QR candidate(s)", image.display(), grids.len());
        for grid in grids {
            match grid.decode() {
                Ok((_meta, content)) if !content.trim().is_empty() => return Ok(content),
                Ok(_) => continue,
                Err(e) => debug!("QR grid failed to decode: {:?}", e),
            }
        }
        Err(CodeError::NotFound)
    }
}

/// Fields carried in the identity-card QR payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityPayload {
    pub uid: Option<String>,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub yob: Option<String>,
    pub dob: Option<String>,
    pub care_of: Option<String>,
    pub house: Option<String>,
    pub street: Option<String>,
    pub landmark: Option<String>,
    pub locality: Option<String>,
    pub vtc: Option<String>,
    pub post_office: Option<String>,
    pub subdistrict: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
}

impl IdentityPayload {
    /// Parse the XML payload.
    pub fn parse(payload: &str) -> Result<Self, CodeError> {
        let mut reader = Reader::from_str(payload.trim());

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e))
                    if e.name().as_ref() == b"PrintLetterBarcodeData" =>
                {
                    let mut out = Self::default();
                    for attr in e.attributes() {
                        let attr = attr.map_err(|e| CodeError::InvalidPayload(e.to_string()))?;
                        let value = attr
                            .unescape_value()
                            .map_err(|e| CodeError::InvalidPayload(e.to_string()))?
                            .trim()
                            .to_string();
                        if value.is_empty() {
                            continue;
                        }
                        out.set(attr.key.as_ref(), value);
                    }
                    return Ok(out);
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(CodeError::InvalidPayload(e.to_string())),
            }
        }

        Err(CodeError::InvalidPayload(
            "missing PrintLetterBarcodeData element".to_string(),
        ))
    }

    fn set(&mut self, key: &[u8], value: String) {
        let slot = match key {
            b"uid" => &mut self.uid,
            b"name" => &mut self.name,
            b"gender" => &mut self.gender,
            b"yob" => &mut self.yob,
            b"dob" => &mut self.dob,
            b"co" => &mut self.care_of,
            b"house" => &mut self.house,
            b"street" => &mut self.street,
            b"lm" => &mut self.landmark,
            b"loc" => &mut self.locality,
            b"vtc" => &mut self.vtc,
            b"po" => &mut self.post_office,
            b"subdist" => &mut self.subdistrict,
            b"dist" => &mut self.district,
            b"state" => &mut self.state,
            b"pc" => &mut self.pincode,
            _ => return,
        };
        *slot = Some(value);
    }

    /// Full date of birth if present, else the year of birth.
    pub fn birth(&self) -> Option<String> {
        self.dob.clone().or_else(|| self.yob.clone())
    }

    /// Last four digits of the identifier.
    pub fn uid_last4(&self) -> Option<String> {
        let digits: String = self.uid.as_deref()?.chars().filter(|c| c.is_ascii_digit()).collect();
        (digits.len() >= 4).then(|| digits[digits.len() - 4..].to_string())
    }

    /// Address components joined in postal order.
    pub fn address(&self) -> Option<String> {
        let parts: Vec<String> = [
            self.care_of.as_ref().map(|v| format!("C/O {}", v)),
            self.house.clone(),
            self.street.clone(),
            self.landmark.clone(),
            self.locality.clone(),
            self.vtc.clone(),
            self.post_office.as_ref().map(|v| format!("PO {}", v)),
            self.subdistrict.clone(),
            self.district.clone(),
            self.state.clone(),
            self.pincode.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();

        (!parts.is_empty()).then(|| parts.join(", "))
    }
}
