//! Text encoding of cookies for durable storage.
//!
//! A record is a versioned, tagged-field binary payload rendered as uppercase
//! hexadecimal so that any text-oriented durable store can hold it.
//!
//! Layout of version 1 (all integers big-endian):
//!
//! | field      | encoding                                                   |
//! |------------|------------------------------------------------------------|
//! | version    | `u8`, always `1`                                           |
//! | name       | `u32` length + UTF-8 bytes                                 |
//! | value      | `u32` length + UTF-8 bytes                                 |
//! | domain     | `u32` length + UTF-8 bytes                                 |
//! | path       | `u32` length + UTF-8 bytes                                 |
//! | expires    | `u8` tag: `0` session, `1` followed by `i128` unix nanos   |
//! | flags      | `u8`: `0x01` secure, `0x02` http-only, `0x04` host-only    |
//! | same_site  | `u8`: `0` absent, `1` Strict, `2` Lax, `3` None            |
//!
//! Decoding never panics: malformed hex, unknown versions, truncated or
//! trailing data all come back as a [`CodecError`]. Encoding fails only for a
//! field longer than `u32::MAX` bytes.

use bytes::{Buf, BufMut, BytesMut};
use time::OffsetDateTime;

use crate::cookies::{Cookie, SameSite};
use crate::errors::CodecError;

const VERSION: u8 = 1;

const EXPIRES_SESSION: u8 = 0;
const EXPIRES_AT: u8 = 1;

const FLAG_SECURE: u8 = 0x01;
const FLAG_HTTP_ONLY: u8 = 0x02;
const FLAG_HOST_ONLY: u8 = 0x04;
const FLAG_MASK: u8 = FLAG_SECURE | FLAG_HTTP_ONLY | FLAG_HOST_ONLY;

/// Encodes `cookie` into an uppercase hex record.
pub fn encode_cookie(cookie: &Cookie) -> Result<String, CodecError> {
    let mut buf = BytesMut::new();
    buf.put_u8(VERSION);

    put_str(&mut buf, &cookie.name, "name")?;
    put_str(&mut buf, &cookie.value, "value")?;
    put_str(&mut buf, &cookie.domain, "domain")?;
    put_str(&mut buf, &cookie.path, "path")?;

    match cookie.expires {
        None => buf.put_u8(EXPIRES_SESSION),
        Some(expires) => {
            buf.put_u8(EXPIRES_AT);
            buf.put_i128(expires.unix_timestamp_nanos());
        }
    }

    let mut flags = 0;
    if cookie.secure {
        flags |= FLAG_SECURE;
    }
    if cookie.http_only {
        flags |= FLAG_HTTP_ONLY;
    }
    if cookie.host_only {
        flags |= FLAG_HOST_ONLY;
    }
    buf.put_u8(flags);

    buf.put_u8(match cookie.same_site {
        None => 0,
        Some(SameSite::Strict) => 1,
        Some(SameSite::Lax) => 2,
        Some(SameSite::None) => 3,
    });

    Ok(hex::encode_upper(&buf))
}

/// Decodes a record produced by [`encode_cookie`].
pub fn decode_cookie(record: &str) -> Result<Cookie, CodecError> {
    let bytes = hex::decode(record.trim())?;
    let mut buf = bytes.as_slice();

    if !buf.has_remaining() {
        return Err(CodecError::Empty);
    }
    let version = buf.get_u8();
    if version != VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let name = get_str(&mut buf, "name")?;
    let value = get_str(&mut buf, "value")?;
    let domain = get_str(&mut buf, "domain")?;
    let path = get_str(&mut buf, "path")?;

    let expires = match get_u8(&mut buf, "expires")? {
        EXPIRES_SESSION => None,
        EXPIRES_AT => {
            ensure(&buf, 16, "expires")?;
            let nanos = buf.get_i128();
            Some(OffsetDateTime::from_unix_timestamp_nanos(nanos).map_err(|_| CodecError::InvalidTimestamp)?)
        }
        tag => return Err(CodecError::InvalidExpiryTag(tag)),
    };

    let flags = get_u8(&mut buf, "flags")?;
    if flags & !FLAG_MASK != 0 {
        return Err(CodecError::InvalidFlags(flags));
    }

    let same_site = match get_u8(&mut buf, "same_site")? {
        0 => None,
        1 => Some(SameSite::Strict),
        2 => Some(SameSite::Lax),
        3 => Some(SameSite::None),
        other => return Err(CodecError::InvalidSameSite(other)),
    };

    if buf.has_remaining() {
        return Err(CodecError::TrailingBytes(buf.remaining()));
    }

    Ok(Cookie {
        name,
        value,
        domain,
        path,
        expires,
        secure: flags & FLAG_SECURE != 0,
        http_only: flags & FLAG_HTTP_ONLY != 0,
        host_only: flags & FLAG_HOST_ONLY != 0,
        same_site,
    })
}

fn put_str(buf: &mut BytesMut, s: &str, field: &'static str) -> Result<(), CodecError> {
    buf.put_u32(field_len(s.len(), field)?);
    buf.put_slice(s.as_bytes());
    Ok(())
}

fn field_len(len: usize, field: &'static str) -> Result<u32, CodecError> {
    u32::try_from(len).map_err(|_| CodecError::FieldTooLong(field))
}

fn ensure(buf: &&[u8], len: usize, field: &'static str) -> Result<(), CodecError> {
    if buf.remaining() < len {
        Err(CodecError::Truncated(field))
    } else {
        Ok(())
    }
}

fn get_u8(buf: &mut &[u8], field: &'static str) -> Result<u8, CodecError> {
    ensure(buf, 1, field)?;
    Ok(buf.get_u8())
}

fn get_str(buf: &mut &[u8], field: &'static str) -> Result<String, CodecError> {
    ensure(buf, 4, field)?;
    let len = buf.get_u32() as usize;
    ensure(buf, len, field)?;

    let raw = buf[..len].to_vec();
    buf.advance(len);
    String::from_utf8(raw).map_err(|_| CodecError::InvalidUtf8(field))
}
