//! Binary container format for LED cube animations (`.lcub`).

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::debug;

use crate::voxel::{FRAME_CELLS, Frame};

/// Magic bytes identifying an LED cube animation file.
pub const CONTAINER_MAGIC: &[u8; 4] = b"LCUB";

/// Current format version.
pub const CONTAINER_VERSION: u16 = 1;

/// Compression applied to the frame block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CompressionType {
    /// Raw cells.
    #[default]
    None = 0,
    /// LZ4 over the whole frame block.
    Lz4 = 1,
}

impl CompressionType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(CompressionType::None),
            1 => Some(CompressionType::Lz4),
            _ => None,
        }
    }
}

/// File header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Number of frames stored.
    pub frame_count: u32,
    /// Playback delay between frames.
    pub frame_delay_ms: u32,
    /// Compression of the frame block.
    pub compression: CompressionType,
}

impl ContainerHeader {
    /// Size of header in bytes.
    /// Magic(4) + Version(2) + Flags(2) + FrameCount(4) + FrameDelay(4) + Reserved(16) = 32
    pub const SIZE: usize = 32;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(CONTAINER_MAGIC)?;
        w.write_all(&CONTAINER_VERSION.to_le_bytes())?;
        w.write_all(&(self.compression as u16).to_le_bytes())?;
        w.write_all(&self.frame_count.to_le_bytes())?;
        w.write_all(&self.frame_delay_ms.to_le_bytes())?;
        // Reserved bytes
        w.write_all(&[0u8; 16])?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if &magic != CONTAINER_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Invalid LCUB magic bytes",
            ));
        }

        let mut buf2 = [0u8; 2];
        let mut buf4 = [0u8; 4];

        r.read_exact(&mut buf2)?;
        let version = u16::from_le_bytes(buf2);
        if version != CONTAINER_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unsupported LCUB version: {}", version),
            ));
        }

        r.read_exact(&mut buf2)?;
        let flags = u16::from_le_bytes(buf2);
        let compression = CompressionType::from_u8((flags & 0x0F) as u8).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unknown LCUB compression flag: {}", flags & 0x0F),
            )
        })?;

        r.read_exact(&mut buf4)?;
        let frame_count = u32::from_le_bytes(buf4);

        r.read_exact(&mut buf4)?;
        let frame_delay_ms = u32::from_le_bytes(buf4);

        // Skip reserved bytes
        let mut reserved = [0u8; 16];
        r.read_exact(&mut reserved)?;

        Ok(Self {
            frame_count,
            frame_delay_ms,
            compression,
        })
    }
}

/// Flatten frames into one contiguous cell block.
pub fn encode_frames(frames: &[Frame]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(frames.len() * FRAME_CELLS);
    for frame in frames {
        bytes.extend_from_slice(frame.cells());
    }
    bytes
}

/// Split a cell block back into frames.
pub fn decode_frames(bytes: &[u8], frame_count: usize) -> io::Result<Vec<Frame>> {
    if bytes.len() != frame_count * FRAME_CELLS {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Frame block size mismatch: {} bytes vs {} frames",
                bytes.len(),
                frame_count
            ),
        ));
    }
    Ok(bytes.chunks_exact(FRAME_CELLS).map(Frame::from_cells).collect())
}

/// Compress data using LZ4.
#[cfg(feature = "lz4")]
pub fn compress_lz4(data: &[u8]) -> Vec<u8> {
    lz4_flex::compress_prepend_size(data)
}

/// Decompress LZ4 data.
#[cfg(feature = "lz4")]
pub fn decompress_lz4(data: &[u8]) -> io::Result<Vec<u8>> {
    lz4_flex::decompress_size_prepended(data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Fallback when LZ4 is not available.
#[cfg(not(feature = "lz4"))]
pub fn compress_lz4(data: &[u8]) -> Vec<u8> {
    data.to_vec()
}

#[cfg(not(feature = "lz4"))]
pub fn decompress_lz4(_data: &[u8]) -> io::Result<Vec<u8>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "LCUB file is LZ4 compressed but the lz4 feature is disabled",
    ))
}

/// Write a complete container to `w`.
///
/// LZ4 is downgraded to no compression when the `lz4` feature is disabled.
pub fn write_container<W: Write>(
    w: &mut W,
    frames: &[Frame],
    frame_delay_ms: u32,
    compression: CompressionType,
) -> io::Result<ContainerHeader> {
    let frame_count = u32::try_from(frames.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "Too many frames for LCUB"))?;
    let compression = if cfg!(feature = "lz4") {
        compression
    } else {
        CompressionType::None
    };
    let header = ContainerHeader {
        frame_count,
        frame_delay_ms,
        compression,
    };
    header.write_to(w)?;

    let raw = encode_frames(frames);
    match compression {
        CompressionType::None => w.write_all(&raw)?,
        CompressionType::Lz4 => w.write_all(&compress_lz4(&raw))?,
    }
    Ok(header)
}

/// Read a complete container from `r`.
pub fn read_container<R: Read>(r: &mut R) -> io::Result<(ContainerHeader, Vec<Frame>)> {
    let header = ContainerHeader::read_from(r)?;

    let mut data = Vec::new();
    r.read_to_end(&mut data)?;

    let raw = match header.compression {
        CompressionType::None => data,
        CompressionType::Lz4 => decompress_lz4(&data)?,
    };

    let frames = decode_frames(&raw, header.frame_count as usize)?;
    Ok((header, frames))
}

/// Save frames to an `.lcub` file.
pub fn save_container<P: AsRef<Path>>(
    path: P,
    frames: &[Frame],
    frame_delay_ms: u32,
    compression: CompressionType,
) -> io::Result<ContainerHeader> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    let header = write_container(&mut writer, frames, frame_delay_ms, compression)?;
    writer.flush()?;
    debug!(
        "wrote {} frames to {} ({:?} compression)",
        header.frame_count,
        path.display(),
        header.compression
    );
    Ok(header)
}

/// Load frames from an `.lcub` file.
pub fn load_container<P: AsRef<Path>>(path: P) -> io::Result<(ContainerHeader, Vec<Frame>)> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    let loaded = read_container(&mut reader)?;
    debug!("read {} frames from {}", loaded.0.frame_count, path.display());
    Ok(loaded)
}
