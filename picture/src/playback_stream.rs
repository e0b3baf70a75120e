use crate::error::*;
use crate::options::*;
use crate::picture::*;
use crate::surface::*;

use futures::*;
use futures::stream;
use futures::future;
use futures::task::{Poll};

use log::*;

use std::sync::*;
use std::result::Result;

///
/// Error from decoding a picture that arrives as a stream of chunks
///
#[derive(Clone, Debug, PartialEq)]
pub enum PictureStreamError<E> {
    /// The picture could not be decoded
    Picture(PictureError),

    /// The source stream returned an error
    Stream(E)
}

impl<E> From<PictureError> for PictureStreamError<E> {
    fn from(err: PictureError) -> PictureStreamError<E> {
        PictureStreamError::Picture(err)
    }
}

impl Picture {
    ///
    /// Plays back this picture, returning the surface calls it makes as a stream
    ///
    /// Playback runs to completion before this returns: every call is collected in memory first, so the stream
    /// never waits and doesn't borrow the picture. Use `playback()` with a `Surface` to handle calls as they're made.
    ///
    /// If playback stops early, the stream contains the calls made up to that point (including the restores that
    /// close any saves that were left open).
    ///
    pub fn playback_stream(&self) -> impl Unpin+Send+Stream<Item=SurfaceCall> {
        let mut calls = Vec::<SurfaceCall>::new();

        if let Err(err) = self.playback(&mut calls) {
            warn!("Picture playback stopped early: {}", err);
        }

        stream::iter(calls)
    }
}

///
/// Decodes a picture that arrives as a stream of byte chunks
///
/// The picture is decoded once the source stream has finished.
///
pub fn decode_picture_stream<In: Unpin+Stream<Item=Result<Vec<u8>, E>>, E>(source: In, options: DecodeOptions) -> impl Unpin+Future<Output=Result<Arc<Picture>, PictureStreamError<E>>> {
    let mut source  = source;
    let mut bytes   = vec![];

    future::poll_fn(move |context| {
        loop {
            match source.poll_next_unpin(context) {
                Poll::Pending                   => { return Poll::Pending; },
                Poll::Ready(Some(Ok(chunk)))    => { bytes.extend(chunk); },
                Poll::Ready(Some(Err(err)))     => { return Poll::Ready(Err(PictureStreamError::Stream(err))); },

                Poll::Ready(None)               => {
                    trace!("Picture stream finished after {} bytes", bytes.len());
                    return Poll::Ready(decode_picture_with_options(&bytes, &options).map_err(PictureStreamError::from));
                }
            }
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::paint::*;
    use crate::recorder::*;
    use crate::geometry::*;

    use futures::executor;

    fn recorded_picture() -> Arc<Picture> {
        let mut recorder = Recorder::new();
        recorder.save();
        recorder.translate(10.0, 20.0);
        recorder.draw_oval(Rect::new(0.0, 0.0, 5.0, 5.0), Paint::with_color(Color::BLUE));
        recorder.restore();

        recorder.finish_recording(Rect::new(0.0, 0.0, 50.0, 50.0))
    }

    #[test]
    fn stream_playback_calls() {
        let picture = recorded_picture();
        let calls   = executor::block_on(picture.playback_stream().collect::<Vec<_>>());

        assert!(calls == vec![
            SurfaceCall::Save,
            SurfaceCall::Translate(10.0, 20.0),
            SurfaceCall::DrawOval(Rect::new(0.0, 0.0, 5.0, 5.0), Paint::with_color(Color::BLUE)),
            SurfaceCall::Restore
        ]);
    }

    #[test]
    fn decode_from_chunks() {
        let bytes   = recorded_picture().encode();
        let chunks  = bytes.chunks(7).map(|chunk| Ok(chunk.to_vec())).collect::<Vec<Result<Vec<u8>, ()>>>();

        let picture = executor::block_on(decode_picture_stream(stream::iter(chunks), DecodeOptions::default())).unwrap();

        assert!(picture.op_count() == 4);
    }

    #[test]
    fn stream_errors_are_passed_on() {
        let chunks  = vec![Ok(vec![b's', b'k']), Err("broken")];
        let result  = executor::block_on(decode_picture_stream(stream::iter(chunks), DecodeOptions::default()));

        assert!(result.err() == Some(PictureStreamError::Stream("broken")));
    }

    #[test]
    fn truncated_stream_fails_to_decode() {
        let bytes   = recorded_picture().encode();
        let chunks  = vec![Ok::<_, ()>(bytes[0..20].to_vec())];
        let result  = executor::block_on(decode_picture_stream(stream::iter(chunks), DecodeOptions::default()));

        assert!(result.err() == Some(PictureStreamError::Picture(PictureError::TruncatedOrOverrun)));
    }
}
