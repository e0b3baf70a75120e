use crate::path::*;
use crate::flat::*;
use crate::image::*;
use crate::paint::*;
use crate::error::*;
use crate::stream::*;
use crate::tables::*;
use crate::options::*;
use crate::surface::*;
use crate::version::*;
use crate::geometry::*;
use crate::playback::*;
use crate::recorder::*;
use crate::typeface::*;
use crate::text_blob::*;
use crate::read_cursor::*;
use crate::write_cursor::*;

use log::*;

use std::mem;
use std::sync::*;

/// The first 8 bytes of every picture
pub const PICTURE_MAGIC: &[u8; 8] = b"skiapict";

/// Trailing byte values that follow the picture header
pub const TRAILING_BYTE_FAILURE: u8         = 0;
pub const TRAILING_BYTE_PICTURE_DATA: u8    = 1;
pub const TRAILING_BYTE_CUSTOM: u8          = 2;

///
/// Packs 4 characters into a chunk tag (the first character ends up in the most significant byte)
///
const fn four_byte_tag(tag: &[u8; 4]) -> u32 {
    ((tag[0] as u32) << 24) | ((tag[1] as u32) << 16) | ((tag[2] as u32) << 8) | (tag[3] as u32)
}

// Outer chunk tags
pub const READER_TAG: u32           = four_byte_tag(b"read");
pub const FACTORY_TAG: u32          = four_byte_tag(b"fact");
pub const TYPEFACE_TAG: u32         = four_byte_tag(b"tpfc");
pub const PICTURE_TAG: u32          = four_byte_tag(b"pctr");
pub const BUFFER_SIZE_TAG: u32      = four_byte_tag(b"aray");
pub const DRAWABLE_TAG: u32         = four_byte_tag(b"draw");
pub const EOF_TAG: u32              = four_byte_tag(b"eof ");

// Chunk tags found in the 'aray' buffer
pub const PAINT_BUFFER_TAG: u32     = four_byte_tag(b"pnt ");
pub const PATH_BUFFER_TAG: u32      = four_byte_tag(b"pth ");
pub const TEXTBLOB_BUFFER_TAG: u32  = four_byte_tag(b"blob");
pub const IMAGE_BUFFER_TAG: u32     = four_byte_tag(b"imag");
pub const VERTICES_BUFFER_TAG: u32  = four_byte_tag(b"vert");
pub const SLUG_BUFFER_TAG: u32      = four_byte_tag(b"slug");

// Vertices flags and modes
const VERTICES_MODE_MASK: u32       = 0xff;
const VERTICES_HAS_TEXS: u32        = 0x100;
const VERTICES_HAS_COLORS: u32      = 0x200;
const VERTICES_MODE_FAN: u32        = 2;

///
/// Formats a chunk tag for the log
///
fn tag_name(tag: u32) -> String {
    tag.to_be_bytes().iter()
        .map(|c| if c.is_ascii_graphic() || *c == b' ' { *c as char } else { '?' })
        .collect()
}

///
/// The values that the ops in a picture refer to by index
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SideTables {
    pub paints:     InternTable<Paint>,
    pub paths:      InternTable<Path>,
    pub images:     InternTable<Image>,
    pub text_blobs: InternTable<TextBlob>,
}

impl SideTables {
    ///
    /// Writes the tables as the chunks of an 'aray' buffer
    ///
    /// Factory names and typefaces used by the values are added to the tables in the cursor.
    ///
    pub fn flatten(&self, buffer: &mut WriteCursor) {
        if !self.paints.is_empty() {
            buffer.write_u32(PAINT_BUFFER_TAG);
            buffer.write_u32(self.paints.len() as u32);
            self.paints.iter().for_each(|paint| paint.write_flat(buffer));
        }

        if !self.paths.is_empty() {
            buffer.write_u32(PATH_BUFFER_TAG);
            buffer.write_u32(self.paths.len() as u32);
            buffer.write_i32(self.paths.len() as i32);
            self.paths.iter().for_each(|path| path.write_flat(buffer));
        }

        if !self.text_blobs.is_empty() {
            buffer.write_u32(TEXTBLOB_BUFFER_TAG);
            buffer.write_u32(self.text_blobs.len() as u32);
            self.text_blobs.iter().for_each(|blob| blob.write_flat(buffer));
        }

        if !self.images.is_empty() {
            buffer.write_u32(IMAGE_BUFFER_TAG);
            buffer.write_u32(self.images.len() as u32);
            self.images.iter().for_each(|image| image.write_flat(buffer));
        }
    }
}

///
/// A sealed recording of drawing operations, along with the values they refer to
///
/// Pictures are created by a `Recorder` or by decoding bytes, and can't be changed afterwards. They're
/// shared through an `Arc` and can be played back from several threads at once.
///
#[derive(Clone, Debug)]
pub struct Picture {
    /// The bounds of what this picture draws
    cull_rect: Rect,

    /// The format version that the op data is laid out for
    version: u32,

    /// The op stream
    op_data: Vec<u8>,

    /// The paints, paths, images and text blobs referred to by the ops
    tables: SideTables,

    /// The factory names used by the effects in the side tables
    factories: FactoryTable,

    /// The typefaces used by the fonts in the side tables
    typefaces: TypefaceTable,

    /// Pictures stored alongside this one
    sub_pictures: Vec<Arc<Picture>>,

    /// The options this picture was decoded with
    options: DecodeOptions,
}

impl Picture {
    ///
    /// Seals some recorded op data into a picture
    ///
    pub (crate) fn from_recording(cull_rect: Rect, version: u32, op_data: Vec<u8>, tables: SideTables) -> Picture {
        // Flattening the tables finds the factories and typefaces they use
        let mut buffer = WriteCursor::new();
        tables.flatten(&mut buffer);
        let (_, factories, typefaces) = buffer.into_parts();

        Picture {
            cull_rect:      cull_rect,
            version:        version,
            op_data:        op_data,
            tables:         tables,
            factories:      factories,
            typefaces:      typefaces,
            sub_pictures:   vec![],
            options:        DecodeOptions::default(),
        }
    }

    ///
    /// Returns a copy of this picture that carries a set of sub-pictures
    ///
    pub fn with_sub_pictures(&self, sub_pictures: Vec<Arc<Picture>>) -> Picture {
        let mut picture         = self.clone();
        picture.sub_pictures    = sub_pictures;
        picture
    }

    #[inline] pub fn cull_rect(&self) -> Rect { self.cull_rect }
    #[inline] pub fn version(&self) -> u32 { self.version }
    #[inline] pub fn factories(&self) -> &FactoryTable { &self.factories }
    #[inline] pub fn typefaces(&self) -> &TypefaceTable { &self.typefaces }
    #[inline] pub fn side_tables(&self) -> &SideTables { &self.tables }
    #[inline] pub fn sub_pictures(&self) -> &[Arc<Picture>] { &self.sub_pictures }
    #[inline] pub fn op_data(&self) -> &[u8] { &self.op_data }

    ///
    /// The number of ops in this picture
    ///
    pub fn op_count(&self) -> usize {
        count_ops(&self.op_data)
    }

    ///
    /// An estimate of the memory used by this picture, including its images, typefaces and sub-pictures
    ///
    pub fn approximate_bytes_used(&self) -> usize {
        let image_bytes: usize      = self.tables.images.iter()
            .map(|image| image.encoded.len() + image.mipmap.as_ref().map(|mipmap| mipmap.len()).unwrap_or(0))
            .sum();
        let typeface_bytes: usize   = self.typefaces.iter()
            .map(|typeface| typeface.data.len())
            .sum();
        let sub_picture_bytes: usize = self.sub_pictures.iter()
            .map(|picture| picture.approximate_bytes_used())
            .sum();

        mem::size_of::<Picture>()
            + self.op_data.len()
            + self.tables.paints.len() * mem::size_of::<Paint>()
            + self.tables.paths.iter().map(|path| mem::size_of::<Path>() + path.ops.len() * mem::size_of::<PathOp>()).sum::<usize>()
            + self.tables.text_blobs.len() * mem::size_of::<TextBlob>()
            + image_bytes
            + typeface_bytes
            + sub_picture_bytes
    }

    ///
    /// Replays the ops in this picture against a surface
    ///
    /// If an op can't be read, playback stops and the reason is returned. The calls that were made before that point
    /// are left in place and any saves that were left open are restored.
    ///
    pub fn playback(&self, surface: &mut dyn Surface) -> Result<(), PictureError> {
        Playback::new(&self.op_data, self.version, &self.tables, &self.options, surface).run()
    }

    ///
    /// Encodes this picture in the current format version
    ///
    pub fn encode(&self) -> Vec<u8> {
        let mut stream = StreamWriter::new();
        self.encode_into(&mut stream, &TypefaceTable::new());
        stream.into_bytes()
    }

    ///
    /// Writes this picture to a stream, given the typefaces already written by the pictures that contain it
    ///
    fn encode_into(&self, stream: &mut StreamWriter, parent_typefaces: &TypefaceTable) {
        if self.version != CURRENT_VERSION {
            // Older op layouts are re-recorded in the current layout before writing
            let mut recorder = Recorder::new();
            if let Err(err) = self.playback(&mut recorder) {
                warn!("Picture could not be fully replayed while upgrading from version {}: {}", self.version, err);
            }

            let mut upgraded            = recorder.finish_picture(self.cull_rect);
            upgraded.sub_pictures       = self.sub_pictures.clone();

            return upgraded.encode_into(stream, parent_typefaces);
        }

        // Header
        stream.write_bytes(PICTURE_MAGIC);
        stream.write_u32(CURRENT_VERSION);
        stream.write_rect(self.cull_rect);
        stream.write_u8(TRAILING_BYTE_PICTURE_DATA);

        // Op data
        if !self.op_data.is_empty() {
            stream.write_u32(READER_TAG);
            stream.write_u32(self.op_data.len() as u32);
            stream.write_bytes(&self.op_data);
        }

        // The side tables are flattened first so we know which factories and typefaces they need
        let mut buffer = WriteCursor::with_tables(FactoryTable::new(), parent_typefaces.clone());
        self.tables.flatten(&mut buffer);
        let (array_data, factories, typefaces) = buffer.into_parts();

        if !factories.is_empty() {
            let size = 4 + factories.iter().map(|name| packed_uint_size(name.len()) + name.len()).sum::<usize>();

            stream.write_u32(FACTORY_TAG);
            stream.write_u32(size as u32);
            stream.write_u32(factories.len() as u32);
            factories.iter().for_each(|name| stream.write_packed_string(name));
        }

        // Only the typefaces that weren't already written by a containing picture are stored here
        let new_typefaces = typefaces.iter().skip(parent_typefaces.len()).collect::<Vec<_>>();
        if !new_typefaces.is_empty() {
            stream.write_u32(TYPEFACE_TAG);
            stream.write_u32(new_typefaces.len() as u32);
            new_typefaces.iter().for_each(|typeface| typeface.serialize(stream));
        }

        if !array_data.is_empty() {
            stream.write_u32(BUFFER_SIZE_TAG);
            stream.write_u32(array_data.len() as u32);
            stream.write_bytes(&array_data);
        }

        if !self.sub_pictures.is_empty() {
            stream.write_u32(PICTURE_TAG);
            stream.write_u32(self.sub_pictures.len() as u32);
            self.sub_pictures.iter().for_each(|picture| picture.encode_into(stream, &typefaces));
        }

        stream.write_u32(EOF_TAG);
    }
}

///
/// Decodes a picture using the default options
///
pub fn decode_picture(bytes: &[u8]) -> Result<Arc<Picture>, PictureError> {
    decode_picture_with_options(bytes, &DecodeOptions::default())
}

///
/// Decodes a picture
///
/// Bytes following the end of the picture are ignored. Nothing is returned if any part of the picture fails to decode,
/// but effects that can't be replayed and are skippable are left out of the picture rather than rejecting it.
///
pub fn decode_picture_with_options(bytes: &[u8], options: &DecodeOptions) -> Result<Arc<Picture>, PictureError> {
    let mut stream = StreamReader::new(bytes);
    let picture     = read_picture(&mut stream, options, &TypefaceTable::new(), options.recursion_limit)?;

    debug!("Decoded picture: version {}, {} bytes of ops, {} sub-pictures", picture.version, picture.op_data.len(), picture.sub_pictures.len());

    Ok(Arc::new(picture))
}

///
/// Reads the magic number, version and cull rect that start a picture
///
fn read_header(stream: &mut StreamReader) -> Result<(u32, Rect), PictureError> {
    let magic = stream.read_bytes(PICTURE_MAGIC.len())?;
    if magic != PICTURE_MAGIC {
        return Err(PictureError::MalformedHeader);
    }

    let version = stream.read_u32()?;
    if !Version::is_supported(version) {
        warn!("Picture version {} is not supported", version);
        return Err(PictureError::MalformedHeader);
    }

    let cull_rect = stream.read_rect()?;

    Ok((version, cull_rect))
}

///
/// Reads a picture from a stream
///
/// `typefaces` are the typefaces of the picture that contains this one: a nested picture can refer to them as well as
/// to the ones it adds itself.
///
fn read_picture(stream: &mut StreamReader, options: &DecodeOptions, typefaces: &TypefaceTable, limit: i32) -> Result<Picture, PictureError> {
    if limit <= 0 {
        warn!("{}", PictureError::RecursionLimitExceeded);
        return Err(PictureError::RecursionLimitExceeded);
    }

    let (version, cull_rect) = read_header(stream)?;

    let trailing = stream.read_u8()?;
    if trailing != TRAILING_BYTE_PICTURE_DATA {
        warn!("{}", PictureError::UnsupportedTrailingByte(trailing));
        return Err(PictureError::UnsupportedTrailingByte(trailing));
    }

    let mut op_data         = None;
    let mut tables          = SideTables::default();
    let mut factories       = FactoryTable::new();
    let mut typefaces       = typefaces.clone();
    let mut sub_pictures    = vec![];

    loop {
        let tag = stream.read_u32()?;
        if tag == EOF_TAG {
            break;
        }

        let size = stream.read_u32()?;
        debug!("Picture chunk '{}' ({})", tag_name(tag), size);

        match tag {
            READER_TAG => {
                if size == 0 {
                    return Err(PictureError::Invalid);
                }

                op_data = Some(stream.read_bytes(size as usize)?.to_vec());
            }

            FACTORY_TAG => {
                let start = stream.position();
                let count = stream.read_u32()?;

                for _ in 0..count {
                    factories.push(stream.read_packed_string()?);
                }

                if stream.position() - start != size as usize {
                    return Err(PictureError::Invalid);
                }
            }

            TYPEFACE_TAG => {
                for _ in 0..size {
                    if stream.is_at_end() {
                        return Err(PictureError::TruncatedOrOverrun);
                    }

                    typefaces.push(Arc::new(Typeface::deserialize(stream)?));
                }
            }

            PICTURE_TAG => {
                for _ in 0..size {
                    sub_pictures.push(Arc::new(read_picture(stream, options, &typefaces, limit - 1)?));
                }
            }

            BUFFER_SIZE_TAG => {
                let data        = stream.read_bytes(size as usize)?;
                let mut buffer  = ReadCursor::new(data)
                    .with_options(*options)
                    .with_version(version)
                    .with_factories(&factories)
                    .with_typefaces(&typefaces)
                    .with_depth(limit);

                read_buffer(&mut buffer, &mut tables, &mut op_data)?;
            }

            DRAWABLE_TAG => {
                warn!("{}", PictureError::RejectedTag(tag));
                return Err(PictureError::RejectedTag(tag));
            }

            _ => {
                warn!("{}", PictureError::UnknownTag(tag));
                return Err(PictureError::UnknownTag(tag));
            }
        }
    }

    Ok(Picture {
        cull_rect:      cull_rect,
        version:        version,
        op_data:        op_data.unwrap_or_default(),
        tables:         tables,
        factories:      factories,
        typefaces:      typefaces,
        sub_pictures:   sub_pictures,
        options:        *options,
    })
}

///
/// Reads the chunks of an 'aray' buffer into a set of side tables
///
fn read_buffer(buffer: &mut ReadCursor, tables: &mut SideTables, op_data: &mut Option<Vec<u8>>) -> Result<(), PictureError> {
    while !buffer.is_at_end() && buffer.is_valid() {
        let tag     = buffer.read_u32();
        let size    = buffer.read_u32();

        read_buffer_chunk(buffer, tag, size, tables, op_data);
    }

    match buffer.error() {
        Some(err)   => Err(err.clone()),
        None        => Ok(())
    }
}

///
/// Reads a single chunk from an 'aray' buffer
///
fn read_buffer_chunk(buffer: &mut ReadCursor, tag: u32, size: u32, tables: &mut SideTables, op_data: &mut Option<Vec<u8>>) {
    trace!("Buffer chunk '{}' ({})", tag_name(tag), size);

    match tag {
        PAINT_BUFFER_TAG    => read_table(buffer, size, &mut tables.paints),
        TEXTBLOB_BUFFER_TAG => read_table(buffer, size, &mut tables.text_blobs),
        IMAGE_BUFFER_TAG    => read_table(buffer, size, &mut tables.images),

        PATH_BUFFER_TAG     => {
            if size > 0 {
                let count = buffer.read_i32();
                if buffer.validate(count > 0) {
                    read_table(buffer, count as u32, &mut tables.paths);
                }
            }
        }

        VERTICES_BUFFER_TAG => {
            for _ in 0..size {
                if !buffer.is_valid() { break; }
                skip_vertices(buffer);
            }
        }

        PICTURE_TAG         => {
            for _ in 0..size {
                if !buffer.is_valid() { break; }
                skip_picture_in_buffer(buffer);
            }
        }

        READER_TAG          => {
            if buffer.read_array_count(size as usize) {
                let bytes = buffer.read_bytes(size as usize);

                if buffer.is_valid() {
                    *op_data = Some(bytes.to_vec());
                }
            }
        }

        SLUG_BUFFER_TAG     |
        DRAWABLE_TAG        => {
            warn!("{}", PictureError::RejectedTag(tag));
            buffer.invalidate_with(PictureError::RejectedTag(tag));
        }

        _                   => {
            warn!("{}", PictureError::UnknownTag(tag));
            buffer.invalidate_with(PictureError::UnknownTag(tag));
        }
    }
}

///
/// Reads `count` values into a side table, invalidating the buffer if any of them can't be read
///
fn read_table<T: FlatDecoding>(buffer: &mut ReadCursor, count: u32, table: &mut InternTable<T>) {
    for _ in 0..count {
        match T::read_flat(buffer) {
            Some(value) => { table.push(value); }
            None        => { buffer.invalidate(); return; }
        }
    }
}

///
/// Reads past a vertices record in an 'aray' buffer
///
pub fn skip_vertices(buffer: &mut ReadCursor) {
    let packed          = buffer.read_u32();
    let vertex_count    = buffer.read_i32();
    let index_count     = buffer.read_i32();
    let attr_count      = buffer.read_i32();

    if !buffer.validate(vertex_count >= 0 && index_count >= 0 && attr_count >= 0) {
        return;
    }

    let mode = packed & VERTICES_MODE_MASK;
    if !buffer.validate(mode <= VERTICES_MODE_FAN) {
        return;
    }

    let vertex_count    = vertex_count as usize;
    let index_count     = index_count as usize;

    let vertex_size     = vertex_count * 8;
    let tex_size        = if packed & VERTICES_HAS_TEXS != 0 { vertex_count * 8 } else { 0 };
    let color_size      = if packed & VERTICES_HAS_COLORS != 0 { vertex_count * 4 } else { 0 };
    let index_size      = if mode == VERTICES_MODE_FAN && index_count == 0 {
        // Fans without indices are stored as triangles
        if !buffer.validate(vertex_count > 2) {
            return;
        }

        (vertex_count - 2) * 6
    } else {
        index_count * 2
    };

    skip_array(buffer, vertex_size);

    if buffer.is_version_lt(Version::VerticesRemoveCustomData) {
        // Custom attribute data was removed, and must be empty in the pictures we can read
        let custom = buffer.read_byte_array();
        if !buffer.validate(custom.is_empty()) {
            return;
        }
    }

    skip_array(buffer, tex_size);
    skip_array(buffer, color_size);
    skip_array(buffer, index_size);
}

///
/// Skips a byte array that must be `size` bytes long
///
fn skip_array(buffer: &mut ReadCursor, size: usize) {
    if buffer.read_array_count(size) {
        buffer.skip(size);
    }
}

///
/// Reads past a picture embedded in a flattened buffer (as used by picture shaders and picture image filters)
///
/// The embedded picture is validated but not kept.
///
pub fn skip_picture_in_buffer(buffer: &mut ReadCursor) {
    let magic       = buffer.read_bytes(PICTURE_MAGIC.len());
    let magic_ok    = magic == PICTURE_MAGIC;
    let version     = buffer.read_u32();
    buffer.read_rect();

    if !buffer.validate_with(magic_ok && Version::is_supported(version), PictureError::MalformedHeader) {
        return;
    }

    let sentinel = buffer.read_i32();
    if sentinel < 0 {
        // Data we can't read, stored with its length
        buffer.skip((-(sentinel as i64)) as usize);
        return;
    } else if sentinel == 0 {
        return;
    }

    let depth = match buffer.nested() {
        Some(depth) => depth,
        None        => { return; }
    };

    let outer_version   = buffer.version();
    let outer_depth     = buffer.depth();
    buffer.set_version(version);
    buffer.set_depth(depth);

    let mut tables      = SideTables::default();
    let mut op_data     = None;

    loop {
        if !buffer.is_valid() {
            break;
        }

        let tag = buffer.read_u32();
        if tag == EOF_TAG {
            break;
        }

        let size = buffer.read_u32();
        read_buffer_chunk(buffer, tag, size, &mut tables, &mut op_data);
    }

    buffer.validate(op_data.is_some());

    buffer.set_version(outer_version);
    buffer.set_depth(outer_depth);
}
