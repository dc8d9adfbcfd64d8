use aliri_braid::braid;
use std::fmt;

/// The client ID this application is registered under with the identity service
#[braid(serde)]
pub struct ClientId;

/// The client secret paired with a [`ClientId`]
#[braid(serde, debug = "owned", display = "owned")]
pub struct ClientSecret;

/// A bearer access token presented by a caller
#[braid(serde, debug = "owned", display = "owned")]
pub struct AccessToken;

/// Writes a secret: only `***label***` normally, and in the alternate form at
/// most `width` characters of it, where `…` stands in for the cut-off rest
fn redact(
    f: &mut fmt::Formatter,
    secret: &str,
    label: &str,
    default_width: usize,
    quote: &str,
) -> fmt::Result {
    if !f.alternate() {
        return write!(f, "***{label}***");
    }

    let width = f.width().unwrap_or(default_width);
    let (shown, cut) = match secret.char_indices().nth(width) {
        None => (secret, ""),
        Some(_) => {
            let end = secret
                .char_indices()
                .nth(width.saturating_sub(1))
                .map_or(0, |(idx, _)| idx);
            (&secret[..end], "…")
        }
    };

    write!(f, "{quote}{shown}{cut}{quote}")
}

macro_rules! redacted {
    ($($ty:ty => $label:literal, reveal $default:literal;)*) => {
        $(
            impl fmt::Debug for $ty {
                fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    redact(f, self.as_str(), $label, $default, "\"")
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    redact(f, self.as_str(), $label, usize::MAX, "")
                }
            }
        )*
    };
}

redacted! {
    ClientSecretRef => "CLIENT SECRET", reveal 5;
    AccessTokenRef => "ACCESS TOKEN", reveal 15;
}
