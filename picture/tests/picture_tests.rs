use flo_picture::*;

use futures::prelude::*;
use futures::executor;

use std::sync::*;

fn bounds() -> Rect {
    Rect::new(0.0, 0.0, 100.0, 100.0)
}

///
/// Records a picture by calling a function on a recorder
///
fn record<RecordFn: FnOnce(&mut Recorder)>(record_fn: RecordFn) -> Arc<Picture> {
    let mut recorder = Recorder::new();
    record_fn(&mut recorder);
    recorder.finish_recording(bounds())
}

fn replay(picture: &Picture) -> Vec<SurfaceCall> {
    let mut calls = Vec::<SurfaceCall>::new();
    picture.playback(&mut calls).unwrap();
    calls
}

///
/// Writes a picture header with the specified op data and nothing else
///
fn picture_with_ops(version: u32, ops: &[u8]) -> Vec<u8> {
    let mut stream = StreamWriter::new();
    stream.write_bytes(PICTURE_MAGIC);
    stream.write_u32(version);
    stream.write_rect(bounds());
    stream.write_u8(TRAILING_BYTE_PICTURE_DATA);
    stream.write_u32(READER_TAG);
    stream.write_u32(ops.len() as u32);
    stream.write_bytes(ops);
    stream.write_u32(EOF_TAG);
    stream.into_bytes()
}

#[test]
fn clipped_rect_survives_encoding() {
    let red_rect    = Rect::new(10.0, 10.0, 50.0, 50.0);
    let picture     = record(|recorder| {
        recorder.save();
        recorder.clip_rect(bounds(), ClipOp::Intersect, false);
        recorder.draw_rect(red_rect, Paint::with_color(Color::RED));
        recorder.restore();
    });

    let decoded = decode_picture(&picture.encode()).unwrap();

    assert!(decoded.cull_rect() == bounds());
    assert!(decoded.op_count() == 4);
    assert!(replay(&decoded) == vec![
        SurfaceCall::Save,
        SurfaceCall::ClipRect(bounds(), ClipOp::Intersect, false),
        SurfaceCall::DrawRect(red_rect, Paint::with_color(Color::RED)),
        SurfaceCall::Restore,
    ]);
}

#[test]
fn nested_clips_point_at_their_own_restore() {
    let picture = record(|recorder| {
        recorder.save();
        recorder.clip_rect(bounds(), ClipOp::Intersect, true);
        recorder.save();
        recorder.clip_rect(Rect::new(5.0, 5.0, 10.0, 10.0), ClipOp::Difference, false);
        recorder.restore();
        recorder.restore();
    });

    let decoded = decode_picture(&picture.encode()).unwrap();
    let ops     = decoded.op_data();
    let word_at = |offset: usize| u32::from_le_bytes([ops[offset], ops[offset+1], ops[offset+2], ops[offset+3]]);

    // save (4 bytes), clip (28 bytes), save, clip, restore, restore
    assert!(ops.len() == 4 + 28 + 4 + 28 + 4 + 4);
    assert!(word_at(28) == 68);
    assert!(word_at(60) == 64);
    assert!(unpack_op(word_at(64)).0 == DrawType::Restore.to_u32());
    assert!(unpack_op(word_at(68)).0 == DrawType::Restore.to_u32());

    assert!(replay(&decoded).len() == 6);
}

#[test]
fn older_pictures_are_upgraded_when_encoded() {
    let mut ops = WriteCursor::new();
    ops.write_u32(pack_op(DrawType::Save, 4));
    ops.write_u32(pack_op(DrawType::Translate, 12));
    ops.write_f32(1.0);
    ops.write_f32(2.0);
    ops.write_u32(pack_op(DrawType::Restore, 4));

    let old_picture = decode_picture(&picture_with_ops(90, ops.bytes())).unwrap();
    assert!(old_picture.version() == 90);

    let upgraded = decode_picture(&old_picture.encode()).unwrap();
    assert!(upgraded.version() == CURRENT_VERSION);
    assert!(replay(&upgraded) == vec![SurfaceCall::Save, SurfaceCall::Translate(1.0, 2.0), SurfaceCall::Restore]);
}

#[test]
fn unknown_effect_is_dropped_from_its_paint() {
    let shaded  = Paint::with_color(Color::BLUE).with_shader(Shader::Color(Color4f::from(Color::GREEN)));
    let picture = record(|recorder| {
        recorder.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Paint::with_color(Color::RED));
        recorder.draw_rect(Rect::new(10.0, 10.0, 20.0, 20.0), shaded);
    });

    // Rename the shader's factory to something that has no decoder
    let mut bytes   = picture.encode();
    let name        = b"SkColorShader";
    let pos         = bytes.windows(name.len()).position(|window| window == name).unwrap();
    bytes[pos..(pos+name.len())].copy_from_slice(b"SkMysteryShdr");

    let decoded = decode_picture(&bytes).unwrap();

    assert!(replay(&decoded) == vec![
        SurfaceCall::DrawRect(Rect::new(0.0, 0.0, 10.0, 10.0), Paint::with_color(Color::RED)),
        SurfaceCall::DrawRect(Rect::new(10.0, 10.0, 20.0, 20.0), Paint::with_color(Color::BLUE)),
    ]);
}

#[test]
fn unskippable_effect_fails_only_its_paint() {
    let plain   = Paint::with_color(Color::RED);
    let shaded  = Paint::with_color(Color::BLUE).with_shader(Shader::Color(Color4f::from(Color::GREEN)));

    let mut buffer = WriteCursor::new();
    plain.write_flat(&mut buffer);
    shaded.write_flat(&mut buffer);
    let (bytes, factories, _) = buffer.into_parts();

    // Decode the color shader as if it were a runtime effect
    let mut registry = FlattenableRegistry::with_defaults();
    assert!(registry.alias(Category::Shader, "SkColorShader", "SkRuntimeShader"));

    let mut rc = ReadCursor::new(&bytes)
        .with_version(CURRENT_VERSION)
        .with_factories(&factories)
        .with_registry(&registry);

    assert!(Paint::read_flat(&mut rc) == Some(plain));
    assert!(Paint::read_flat(&mut rc).is_none());
    assert!(rc.error() == Some(&PictureError::UnsupportedAndUnskippable("SkColorShader".to_string())));
}

#[test]
fn max_op_count_limits_playback() {
    let picture = record(|recorder| {
        recorder.save();
        recorder.clip_rect(bounds(), ClipOp::Intersect, false);
        recorder.draw_rect(Rect::new(10.0, 10.0, 50.0, 50.0), Paint::with_color(Color::RED));
        recorder.restore();
    });

    let options = DecodeOptions::default().with_max_op_count(Some(2));
    let decoded = decode_picture_with_options(&picture.encode(), &options).unwrap();

    // The save that was left open is restored
    assert!(replay(&decoded) == vec![
        SurfaceCall::Save,
        SurfaceCall::ClipRect(bounds(), ClipOp::Intersect, false),
        SurfaceCall::Restore,
    ]);
}

#[test]
fn unsupported_op_stops_playback() {
    let mut ops = WriteCursor::new();
    ops.write_u32(pack_op(DrawType::Save, 4));
    ops.write_u32(pack_op(DrawType::Rotate, 8));
    ops.write_f32(45.0);
    ops.write_u32(pack_op(DrawType::DrawRegion, 8));
    ops.write_u32(0);
    ops.write_u32(pack_op(DrawType::Rotate, 8));
    ops.write_f32(90.0);

    let picture     = decode_picture(&picture_with_ops(CURRENT_VERSION, ops.bytes())).unwrap();
    let mut calls   = Vec::<SurfaceCall>::new();
    let result      = picture.playback(&mut calls);

    assert!(result == Err(PictureError::UnsupportedOp(DrawType::DrawRegion.to_u32())));
    assert!(calls == vec![SurfaceCall::Save, SurfaceCall::Rotate(45.0), SurfaceCall::Restore]);
}

#[test]
fn shared_picture_replays_on_several_threads() {
    let picture = record(|recorder| {
        recorder.draw_oval(Rect::new(0.0, 0.0, 30.0, 30.0), Paint::with_color(Color::BLUE));
    });

    let threads = (0..4).map(|_| {
        let picture = Arc::clone(&picture);
        std::thread::spawn(move || replay(&picture))
    }).collect::<Vec<_>>();

    for thread in threads {
        assert!(thread.join().unwrap() == replay(&picture));
    }
}

#[test]
fn stream_of_chunks() {
    let picture = record(|recorder| {
        recorder.rotate(30.0);
        recorder.draw_paint(Paint::with_color(Color::GREEN));
    });
    let bytes   = picture.encode();

    executor::block_on(async {
        let chunks  = bytes.chunks(5).map(|chunk| Ok::<_, ()>(chunk.to_vec())).collect::<Vec<_>>();
        let decoded = decode_picture_stream(stream::iter(chunks), DecodeOptions::default()).await.unwrap();

        let calls   = decoded.playback_stream().collect::<Vec<_>>().await;
        assert!(calls == vec![SurfaceCall::Rotate(30.0), SurfaceCall::DrawPaint(Paint::with_color(Color::GREEN))]);
    });
}

#[test]
fn options_from_json() {
    let options: DecodeOptions = serde_json::from_str(r#"{ "recursion_limit": 5 }"#).unwrap();

    assert!(options.recursion_limit == 5);
    assert!(options.allow_custom_typefaces);
    assert!(options.max_op_count.is_none());
}

#[test]
fn calls_serialize_as_json() {
    let picture = record(|recorder| {
        recorder.save();
        recorder.draw_rect(Rect::new(1.0, 2.0, 3.0, 4.0), Paint::with_color(Color::RED));
        recorder.restore();
    });

    let calls   = replay(&picture);
    let json    = serde_json::to_string(&calls).unwrap();
    let loaded  = serde_json::from_str::<Vec<SurfaceCall>>(&json).unwrap();

    assert!(loaded == calls);
}

#[test]
fn text_and_images_survive_encoding() {
    let typeface    = Arc::new(Typeface::new(FontDescriptor::with_family("Lato"), vec![0, 1, 0, 0, 42]));
    let font        = Font::new(Some(Arc::clone(&typeface)), 12.0);
    let glyphs      = TextRun::with_points(font, vec![36, 37], &[Point::new(0.0, 10.0), Point::new(8.0, 10.0)]);
    let blob        = TextBlob::new(Rect::new(0.0, 0.0, 20.0, 12.0), vec![glyphs]);
    let image       = Image::from_encoded(vec![0x89, b'P', b'N', b'G', 1, 2, 3]);

    let picture     = record(|recorder| {
        recorder.draw_text_blob(blob.clone(), 5.0, 6.0, Paint::with_color(Color::BLUE));
        recorder.draw_image(image.clone(), 20.0, 30.0, SamplingOptions::default(), None);
    });

    let decoded     = decode_picture(&picture.encode()).unwrap();

    assert!(decoded.typefaces().len() == 1);
    assert!(decoded.side_tables().images.len() == 1);
    assert!(replay(&decoded) == replay(&picture));
    assert!(replay(&decoded) == vec![
        SurfaceCall::DrawTextBlob(blob, 5.0, 6.0, Paint::with_color(Color::BLUE)),
        SurfaceCall::DrawImage { image, x: 20.0, y: 30.0, sampling: SamplingOptions::default(), paint: None },
    ]);
}
