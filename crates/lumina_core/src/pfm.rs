//! Portable Float Map codec.
//!
//! PFM is a minimal HDR format: an ASCII header (`PF`, the image size,
//! a signed scale whose sign declares the byte order) followed by raw
//! binary32 RGB triples, rows stored bottom-to-top. The write path
//! always emits little-endian data with scale `-1.0`; the read path
//! honors whatever the file declares.

use std::io::{ErrorKind, Read, Write};

use lumina_math::Color;
use thiserror::Error;

use crate::hdr_image::HdrImage;

/// Errors from PFM decoding and encoding.
#[derive(Error, Debug)]
pub enum PfmError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid magic \"{0}\", a PFM file must start with \"PF\"")]
    InvalidMagic(String),

    #[error("invalid image size \"{0}\", expected \"<width> <height>\" with positive integers")]
    InvalidImageSize(String),

    #[error("invalid scale \"{0}\", expected a non-zero float")]
    InvalidScale(String),

    #[error("unexpected end of file")]
    Truncated,
}

/// Byte order of the binary pixel payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// Read one binary32 float with the given byte order.
pub fn read_float(stream: &mut impl Read, endianness: Endianness) -> Result<f32, PfmError> {
    let mut bytes = [0u8; 4];
    stream.read_exact(&mut bytes).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            PfmError::Truncated
        } else {
            PfmError::Io(e)
        }
    })?;

    Ok(match endianness {
        Endianness::Little => f32::from_le_bytes(bytes),
        Endianness::Big => f32::from_be_bytes(bytes),
    })
}

/// Write one binary32 float with the given byte order.
pub fn write_float(
    stream: &mut impl Write,
    value: f32,
    endianness: Endianness,
) -> Result<(), PfmError> {
    let bytes = match endianness {
        Endianness::Little => value.to_le_bytes(),
        Endianness::Big => value.to_be_bytes(),
    };
    stream.write_all(&bytes)?;
    Ok(())
}

/// Read bytes up to (and excluding) the next newline.
pub fn read_line(stream: &mut impl Read) -> Result<String, PfmError> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        match stream.read(&mut byte)? {
            0 => break, // EOF
            _ => {
                if byte[0] == b'\n' {
                    break;
                }
                line.push(byte[0]);
            }
        }
    }

    if line.is_empty() {
        return Err(PfmError::Truncated);
    }

    String::from_utf8(line).map_err(|_| PfmError::Truncated)
}

/// Parse the `<width> <height>` header line. Exactly two positive
/// integers; anything else fails.
pub fn parse_image_size(line: &str) -> Result<(u32, u32), PfmError> {
    let invalid = || PfmError::InvalidImageSize(line.to_string());

    let mut tokens = line.split_whitespace();
    let width: u32 = tokens.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
    let height: u32 = tokens.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;

    if tokens.next().is_some() || width == 0 || height == 0 {
        return Err(invalid());
    }

    Ok((width, height))
}

/// Parse the scale line: a negative scale means little-endian data, a
/// positive one big-endian. Zero is malformed.
pub fn parse_endianness(line: &str) -> Result<Endianness, PfmError> {
    let invalid = || PfmError::InvalidScale(line.to_string());
    let scale: f32 = line.trim().parse().map_err(|_| invalid())?;

    if scale < 0.0 {
        Ok(Endianness::Little)
    } else if scale > 0.0 {
        Ok(Endianness::Big)
    } else {
        Err(invalid())
    }
}

/// Decode a PFM image from a byte stream.
pub fn read_pfm(stream: &mut impl Read) -> Result<HdrImage, PfmError> {
    let magic = read_line(stream)?;
    if magic != "PF" {
        return Err(PfmError::InvalidMagic(magic));
    }

    let (width, height) = parse_image_size(&read_line(stream)?)?;
    let endianness = parse_endianness(&read_line(stream)?)?;

    let mut image = HdrImage::new(width, height);
    for j in (0..height).rev() {
        for i in 0..width {
            let r = read_float(stream, endianness)?;
            let g = read_float(stream, endianness)?;
            let b = read_float(stream, endianness)?;
            image.set_pixel(i, j, Color::new(r, g, b));
        }
    }

    Ok(image)
}

/// Encode an image as little-endian PFM.
pub fn write_pfm(image: &HdrImage, stream: &mut impl Write) -> Result<(), PfmError> {
    write!(stream, "PF\n{} {}\n-1.0\n", image.width(), image.height())?;

    for j in (0..image.height()).rev() {
        for i in 0..image.width() {
            let pixel = image.get_pixel(i, j);
            write_float(stream, pixel.x, Endianness::Little)?;
            write_float(stream, pixel.y, Endianness::Little)?;
            write_float(stream, pixel.z, Endianness::Little)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Content of the 3x2 little-endian reference image
    const LE_REFERENCE_BYTES: &[u8] = &[
        0x50, 0x46, 0x0a, 0x33, 0x20, 0x32, 0x0a, 0x2d, 0x31, 0x2e, 0x30, 0x0a, 0x00, 0x00, 0xc8,
        0x42, 0x00, 0x00, 0x48, 0x43, 0x00, 0x00, 0x96, 0x43, 0x00, 0x00, 0xc8, 0x43, 0x00, 0x00,
        0xfa, 0x43, 0x00, 0x00, 0x16, 0x44, 0x00, 0x00, 0x2f, 0x44, 0x00, 0x00, 0x48, 0x44, 0x00,
        0x00, 0x61, 0x44, 0x00, 0x00, 0x20, 0x41, 0x00, 0x00, 0xa0, 0x41, 0x00, 0x00, 0xf0, 0x41,
        0x00, 0x00, 0x20, 0x42, 0x00, 0x00, 0x48, 0x42, 0x00, 0x00, 0x70, 0x42, 0x00, 0x00, 0x8c,
        0x42, 0x00, 0x00, 0xa0, 0x42, 0x00, 0x00, 0xb4, 0x42,
    ];

    // Same image, big-endian
    const BE_REFERENCE_BYTES: &[u8] = &[
        0x50, 0x46, 0x0a, 0x33, 0x20, 0x32, 0x0a, 0x31, 0x2e, 0x30, 0x0a, 0x42, 0xc8, 0x00, 0x00,
        0x43, 0x48, 0x00, 0x00, 0x43, 0x96, 0x00, 0x00, 0x43, 0xc8, 0x00, 0x00, 0x43, 0xfa, 0x00,
        0x00, 0x44, 0x16, 0x00, 0x00, 0x44, 0x2f, 0x00, 0x00, 0x44, 0x48, 0x00, 0x00, 0x44, 0x61,
        0x00, 0x00, 0x41, 0x20, 0x00, 0x00, 0x41, 0xa0, 0x00, 0x00, 0x41, 0xf0, 0x00, 0x00, 0x42,
        0x20, 0x00, 0x00, 0x42, 0x48, 0x00, 0x00, 0x42, 0x70, 0x00, 0x00, 0x42, 0x8c, 0x00, 0x00,
        0x42, 0xa0, 0x00, 0x00, 0x42, 0xb4, 0x00, 0x00,
    ];

    fn check_reference_image(image: &HdrImage) {
        assert_eq!(image.width(), 3);
        assert_eq!(image.height(), 2);

        assert_eq!(image.get_pixel(0, 0), Color::new(1.0e1, 2.0e1, 3.0e1));
        assert_eq!(image.get_pixel(1, 0), Color::new(4.0e1, 5.0e1, 6.0e1));
        assert_eq!(image.get_pixel(2, 0), Color::new(7.0e1, 8.0e1, 9.0e1));
        assert_eq!(image.get_pixel(0, 1), Color::new(1.0e2, 2.0e2, 3.0e2));
        assert_eq!(image.get_pixel(1, 1), Color::new(4.0e2, 5.0e2, 6.0e2));
        assert_eq!(image.get_pixel(2, 1), Color::new(7.0e2, 8.0e2, 9.0e2));
    }

    #[test]
    fn test_read_line() {
        let mut stream = "hello\nworld!".as_bytes();
        assert_eq!(read_line(&mut stream).unwrap(), "hello");
        assert_eq!(read_line(&mut stream).unwrap(), "world!");
        assert!(read_line(&mut stream).is_err());
    }

    #[test]
    fn test_parse_image_size() {
        assert_eq!(parse_image_size("2 5").unwrap(), (2, 5));
        assert!(parse_image_size("-2 5").is_err());
        assert!(parse_image_size("2 0").is_err());
        assert!(parse_image_size("2 a").is_err());
        assert!(parse_image_size("2").is_err());
        assert!(parse_image_size("2 5 3").is_err());
    }

    #[test]
    fn test_parse_endianness() {
        assert_eq!(parse_endianness("-1.0").unwrap(), Endianness::Little);
        assert_eq!(parse_endianness("1000.0").unwrap(), Endianness::Big);
        assert!(parse_endianness("e").is_err());
        assert!(parse_endianness("0.0").is_err());
    }

    #[test]
    fn test_read_float() {
        // 100.0 little-endian, then 200.0 big-endian, then a stray byte
        let bytes: [u8; 9] = [0x00, 0x00, 0xc8, 0x42, 0x43, 0x48, 0x00, 0x00, 0x00];
        let mut stream = &bytes[..];

        assert_eq!(read_float(&mut stream, Endianness::Little).unwrap(), 100.0);
        assert_eq!(read_float(&mut stream, Endianness::Big).unwrap(), 200.0);
        assert!(matches!(
            read_float(&mut stream, Endianness::Big),
            Err(PfmError::Truncated)
        ));
    }

    #[test]
    fn test_read_little_endian() {
        let mut stream = LE_REFERENCE_BYTES;
        let image = read_pfm(&mut stream).unwrap();
        check_reference_image(&image);
    }

    #[test]
    fn test_read_big_endian() {
        let mut stream = BE_REFERENCE_BYTES;
        let image = read_pfm(&mut stream).unwrap();
        check_reference_image(&image);
    }

    #[test]
    fn test_write_matches_reference_bytes() {
        let mut stream = LE_REFERENCE_BYTES;
        let image = read_pfm(&mut stream).unwrap();

        let mut written = Vec::new();
        write_pfm(&image, &mut written).unwrap();
        assert_eq!(written, LE_REFERENCE_BYTES);
    }

    #[test]
    fn test_round_trip() {
        let mut image = HdrImage::new(2, 3);
        for j in 0..3 {
            for i in 0..2 {
                image.set_pixel(i, j, Color::new(i as f32, j as f32, i as f32 + j as f32));
            }
        }

        let mut buffer = Vec::new();
        write_pfm(&image, &mut buffer).unwrap();
        let decoded = read_pfm(&mut buffer.as_slice()).unwrap();
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_invalid_magic() {
        let mut stream = "PG\n3 2\n-1.0\n".as_bytes();
        assert!(matches!(
            read_pfm(&mut stream),
            Err(PfmError::InvalidMagic(_))
        ));
    }

    #[test]
    fn test_truncated_pixel_data() {
        let mut stream = "PF\n3 2\n-1.0\nstop".as_bytes();
        assert!(matches!(read_pfm(&mut stream), Err(PfmError::Truncated)));
    }

    #[test]
    fn test_malformed_headers() {
        let mut bad_size = "PF\n3 2 1\n-1.0\n".as_bytes();
        assert!(matches!(
            read_pfm(&mut bad_size),
            Err(PfmError::InvalidImageSize(_))
        ));

        let mut bad_scale = "PF\n3 2\n0.0\n".as_bytes();
        assert!(matches!(
            read_pfm(&mut bad_scale),
            Err(PfmError::InvalidScale(_))
        ));
    }
}
