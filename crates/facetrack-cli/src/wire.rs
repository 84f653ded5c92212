//! JSON-lines frame format.

use facetrack_core::Detection;
use serde::{Deserialize, Serialize};

/// One input line: the faces found in a single frame of a stream.
#[derive(Debug, Clone, Deserialize)]
pub struct FrameInput {
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default)]
    pub faces: Vec<Detection>,
}

/// One output line: the same faces, tracked and smoothed.
#[derive(Debug, Serialize)]
pub struct FrameOutput<'a> {
    pub stream: &'a str,
    pub frame: u64,
    pub faces: &'a [Detection],
}

pub fn parse_frame(line: &str) -> Result<FrameInput, serde_json::Error> {
    serde_json::from_str(line)
}

pub fn encode_frame(out: &FrameOutput<'_>) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = serde_json::to_vec(out)?;
    buf.push(b'\n');
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use facetrack_core::BoundingBox;

    #[test]
    fn test_parse_frame_defaults() {
        let frame = parse_frame("{}").unwrap();
        assert!(frame.stream.is_none());
        assert!(frame.faces.is_empty());
    }

    #[test]
    fn test_parse_frame_with_faces() {
        let frame = parse_frame(
            r#"{"stream":"cam0","faces":[{"bbox":[1,2,3,4],"confidence":0.9,"age":25}]}"#,
        )
        .unwrap();
        assert_eq!(frame.stream.as_deref(), Some("cam0"));
        assert_eq!(frame.faces.len(), 1);
        assert_eq!(frame.faces[0].bbox, BoundingBox::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(frame.faces[0].age, Some(25.0));
    }

    #[test]
    fn test_parse_frame_rejects_garbage() {
        assert!(parse_frame("not json").is_err());
        assert!(parse_frame(r#"{"faces": 3}"#).is_err());
    }

    #[test]
    fn test_parse_frame_keeps_faces_beside_bad_emotion() {
        let frame = parse_frame(
            r#"{"faces":[{"bbox":[0,0,10,10],"confidence":0.9},{"bbox":[50,50,10,10],"dominant_emotion":3}]}"#,
        )
        .unwrap();
        assert_eq!(frame.faces.len(), 2);
        assert_eq!(frame.faces[1].bbox, BoundingBox::new(50.0, 50.0, 10.0, 10.0));
        assert_eq!(frame.faces[1].dominant_emotion, None);
    }

    #[test]
    fn test_encode_frame_is_one_line() {
        let mut det = Detection::new(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 1.0);
        det.track_id = Some(4);
        let faces = vec![det];
        let bytes = encode_frame(&FrameOutput {
            stream: "cam0",
            frame: 7,
            faces: &faces,
        })
        .unwrap();

        assert_eq!(bytes.last(), Some(&b'\n'));
        assert_eq!(bytes.iter().filter(|&&b| b == b'\n').count(), 1);
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["frame"], 7);
        assert_eq!(value["faces"][0]["track_id"], 4);
    }
}
