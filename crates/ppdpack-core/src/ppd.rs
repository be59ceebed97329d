//! PPD record parsing.
//!
//! A PPD file is a list of `*Keyword: value` lines. Only a handful of main
//! keywords matter for listing, and they are picked out by a table-driven
//! line scanner: each row maps a keyword to a setter on [`PpdFields`].
//! Every `*Product` directive becomes one [`PpdRecord`]; all records of a
//! file share the scalar fields.

use std::borrow::Cow;

use thiserror::Error;

use crate::language::{DEFAULT_LANGUAGE, language_code};

/// Content-level problems that make a file unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A required main keyword never appeared.
    #[error("missing *{0} directive")]
    MissingField(&'static str),
}

/// One routable printer entry produced from a PPD file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PpdRecord {
    /// `"{product_index}/{source_path}"`.
    pub identifier: String,
    /// Logical filename the record was parsed under.
    pub source_path: String,
    /// Position of the product in its file, 0-based.
    pub product_index: usize,
    /// ISO 639-1 code, absent when the file names no known language.
    pub language: Option<&'static str>,
    /// `*Manufacturer`.
    pub manufacturer: String,
    /// `*NickName`.
    pub nickname: String,
    /// `*ModelName`, empty when the file has products but no model name.
    pub model_name: String,
    /// `*1284DeviceID`, verbatim.
    pub device_id: Option<String>,
    /// The `*Product` string, or the model name for files without products.
    pub product: String,
}

impl PpdRecord {
    /// Listing line for the runtime: `"id" lang "manufacturer" "nickname" "device-id"`.
    ///
    /// Double quotes inside the manufacturer, nickname and device id are
    /// replaced with single quotes so the line stays tokenisable by
    /// spoolers. The identifier is kept verbatim: it is the key `cat`
    /// resolves, so the listed name must match it exactly.
    pub fn description(&self) -> String {
        format!(
            "\"{}\" {} \"{}\" \"{}\" \"{}\"",
            self.identifier,
            self.language.unwrap_or(DEFAULT_LANGUAGE),
            sanitize(&self.manufacturer),
            sanitize(&self.nickname),
            sanitize(self.device_id.as_deref().unwrap_or_default()),
        )
    }
}

fn sanitize(field: &str) -> Cow<'_, str> {
    if field.contains('"') {
        Cow::Owned(field.replace('"', "'"))
    } else {
        Cow::Borrowed(field)
    }
}

/// Scalar fields collected from one file. `None` means the keyword never appeared.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PpdFields {
    /// Raw `*LanguageVersion` value.
    pub language_version: Option<String>,
    /// `*Manufacturer`.
    pub manufacturer: Option<String>,
    /// `*NickName`.
    pub nickname: Option<String>,
    /// `*ModelName`.
    pub model_name: Option<String>,
    /// `*1284DeviceID`.
    pub device_id: Option<String>,
    /// Every `*Product`, in file order.
    pub products: Vec<String>,
}

type Setter = fn(&mut PpdFields, &str);

const SCANNERS: &[(&str, Setter)] = &[
    ("LanguageVersion", set_language_version),
    ("Manufacturer", set_manufacturer),
    ("NickName", set_nickname),
    ("ModelName", set_model_name),
    ("1284DeviceID", set_device_id),
    ("Product", push_product),
];

fn first(slot: &mut Option<String>, value: &str) {
    if slot.is_none() {
        *slot = Some(unquote(value).to_string());
    }
}

fn set_language_version(fields: &mut PpdFields, value: &str) {
    first(&mut fields.language_version, value);
}

fn set_manufacturer(fields: &mut PpdFields, value: &str) {
    first(&mut fields.manufacturer, value);
}

fn set_nickname(fields: &mut PpdFields, value: &str) {
    first(&mut fields.nickname, value);
}

fn set_model_name(fields: &mut PpdFields, value: &str) {
    first(&mut fields.model_name, value);
}

fn set_device_id(fields: &mut PpdFields, value: &str) {
    first(&mut fields.device_id, value);
}

fn push_product(fields: &mut PpdFields, value: &str) {
    let value = unquote(value);
    let value = value
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
        .unwrap_or(value);
    fields.products.push(value.trim().to_string());
}

/// Strip one pair of enclosing double quotes. An unterminated quote (a
/// value continued on following lines) keeps everything after the opening
/// quote.
fn unquote(value: &str) -> &str {
    let value = value.trim();
    match value.strip_prefix('"') {
        Some(rest) => rest.split_once('"').map_or(rest, |(inner, _)| inner).trim(),
        None => value,
    }
}

/// Split a `*Keyword: value` line. Lines with an option keyword
/// (`*Keyword Option: value`), comments and non-keyword lines yield `None`.
fn split_main_keyword(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix('*')?;
    if rest.starts_with('%') {
        return None;
    }
    let end = rest.find(|c: char| c == ':' || c.is_whitespace())?;
    let (keyword, tail) = rest.split_at(end);
    let value = tail.strip_prefix(':')?;
    Some((keyword, value))
}

/// Decode PPD bytes. UTF-8 when valid, ISO-8859-1 otherwise.
pub fn decode_text(content: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(content) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(content.iter().map(|&b| char::from(b)).collect()),
    }
}

/// Run the keyword scanner over `text`.
pub fn scan_fields(text: &str) -> PpdFields {
    let mut fields = PpdFields::default();
    for line in text.split(['\n', '\r']) {
        let Some((keyword, value)) = split_main_keyword(line) else {
            continue;
        };
        if let Some((_, setter)) = SCANNERS.iter().find(|(name, _)| *name == keyword) {
            setter(&mut fields, value);
        }
    }
    fields
}

/// Parse one PPD file into its records.
///
/// Emits one record per `*Product` directive, or a single record named
/// after `*ModelName` when the file has none.
///
/// # Errors
///
/// Returns [`ParseError::MissingField`] when `*Manufacturer` or
/// `*NickName` is missing, or when neither `*Product` nor `*ModelName`
/// is present.
pub fn parse(content: &[u8], logical_filename: &str) -> Result<Vec<PpdRecord>, ParseError> {
    let text = decode_text(content);
    let fields = scan_fields(&text);

    let manufacturer = fields
        .manufacturer
        .ok_or(ParseError::MissingField("Manufacturer"))?;
    let nickname = fields.nickname.ok_or(ParseError::MissingField("NickName"))?;
    let language = fields.language_version.as_deref().and_then(language_code);

    let products = if fields.products.is_empty() {
        let model = fields
            .model_name
            .clone()
            .ok_or(ParseError::MissingField("Product"))?;
        vec![model]
    } else {
        fields.products
    };
    let model_name = fields.model_name.unwrap_or_default();

    Ok(products
        .into_iter()
        .enumerate()
        .map(|(index, product)| PpdRecord {
            identifier: format!("{index}/{logical_filename}"),
            source_path: logical_filename.to_string(),
            product_index: index,
            language,
            manufacturer: manufacturer.clone(),
            nickname: nickname.clone(),
            model_name: model_name.clone(),
            device_id: fields.device_id.clone(),
            product,
        })
        .collect())
}
