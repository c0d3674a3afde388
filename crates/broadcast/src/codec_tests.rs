// SPDX-License-Identifier: MIT

use super::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Sample {
    name: String,
    values: Vec<i64>,
}

fn sample() -> Sample {
    Sample { name: "lookup".into(), values: vec![1, 2, 3] }
}

#[test]
fn auto_round_trips_through_the_fast_binary_codec() {
    let bytes = BroadcastCodec::Auto.encode(&sample()).unwrap();
    let decoded: Sample = BroadcastCodec::Auto.decode(&bytes).unwrap();
    assert_eq!(decoded, sample());
}

#[test]
fn bincode_and_json_both_round_trip() {
    for codec in [BroadcastCodec::Bincode, BroadcastCodec::Json] {
        let bytes = codec.encode(&sample()).unwrap();
        let decoded: Sample = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, sample());
    }
}

#[test]
fn json_bytes_are_human_readable() {
    let bytes = BroadcastCodec::Json.encode(&sample()).unwrap();
    assert!(String::from_utf8(bytes).unwrap().contains("\"lookup\""));
}

#[test]
fn decode_rejects_garbage() {
    let err = BroadcastCodec::Bincode.decode::<Sample>(&[0xff, 0x01]).unwrap_err();
    assert!(matches!(err, BndlError::ProtocolError(_)));
}
