use url::Url;

/// Edge length in pixels requested from the QR service.
pub const QR_SIZE: u32 = 300;

/// Public address of a memorial page.
pub fn memorial_share_url(site_url: &str, slug: &str) -> String {
    format!("{}/m/{}", site_url.trim_end_matches('/'), slug)
}

/// qr_image_url
///
/// Builds the image URL of the external QR generation service encoding `data`. The data is
/// query-encoded, so share URLs with their own query strings survive intact.
pub fn qr_image_url(service_url: &str, data: &str) -> Result<String, url::ParseError> {
    let size = format!("{QR_SIZE}x{QR_SIZE}");
    let url = Url::parse_with_params(service_url, &[("size", size.as_str()), ("data", data)])?;
    Ok(url.into())
}
