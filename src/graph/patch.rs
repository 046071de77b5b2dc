//! In-place relabelling of an encoded graph file.
//!
//! A label update must not lose anything the graph file carries, including
//! fields [`super::proto`] never declares and records the store drops at
//! load (dangling edges, duplicate waypoints). The encoded bytes are walked
//! field by field and copied verbatim; only the `name` inside the matching
//! waypoints' annotations is replaced.

use prost::encoding::{decode_key, decode_varint, encode_key, encode_varint, WireType};
use prost::Message;

use super::proto;
use crate::error::{Error, Result};

const GRAPH_WAYPOINTS: u32 = 1;
const WAYPOINT_ANNOTATIONS: u32 = 4;
const ANNOTATIONS_NAME: u32 = 1;

/// One top-level field of an encoded message.
struct Field<'a> {
    tag: u32,
    wire_type: WireType,
    /// Key, length prefix and payload exactly as encoded.
    raw: &'a [u8],
    /// Payload of a length-delimited field; empty otherwise.
    body: &'a [u8],
}

/// Split an encoded message into its top-level fields, in wire order.
fn fields(message: &[u8]) -> Result<Vec<Field<'_>>> {
    let mut fields = Vec::new();
    let mut rest = message;
    while !rest.is_empty() {
        let start = message.len() - rest.len();
        let (tag, wire_type) = decode_key(&mut rest)?;
        let body = match wire_type {
            WireType::Varint => {
                decode_varint(&mut rest)?;
                &[][..]
            }
            WireType::SixtyFourBit => take(&mut rest, 8)?,
            WireType::ThirtyTwoBit => take(&mut rest, 4)?,
            WireType::LengthDelimited => {
                let len = usize::try_from(decode_varint(&mut rest)?)
                    .map_err(|_| malformed("field length overflows"))?;
                take(&mut rest, len)?
            }
            WireType::StartGroup | WireType::EndGroup => {
                return Err(malformed("groups are not supported"));
            }
        };
        let end = message.len() - rest.len();
        fields.push(Field {
            tag,
            wire_type,
            raw: &message[start..end],
            body,
        });
    }
    Ok(fields)
}

fn take<'a>(rest: &mut &'a [u8], len: usize) -> Result<&'a [u8]> {
    if rest.len() < len {
        return Err(malformed("truncated field"));
    }
    let (head, tail) = rest.split_at(len);
    *rest = tail;
    Ok(head)
}

fn malformed(reason: &str) -> Error {
    Error::Persistence(format!("malformed graph file: {}", reason))
}

fn put_length_delimited(out: &mut Vec<u8>, tag: u32, body: &[u8]) {
    encode_key(tag, WireType::LengthDelimited, out);
    encode_varint(body.len() as u64, out);
    out.extend_from_slice(body);
}

/// Copy `message`, replacing every occurrence of length-delimited field `tag`
/// by `rewrite(Some(old_body))`. When the field is absent, `rewrite(None)` is
/// inserted at its tag-ordered position. A `None` result drops the field.
fn rewrite_field(
    message: &[u8],
    tag: u32,
    mut rewrite: impl FnMut(Option<&[u8]>) -> Result<Option<Vec<u8>>>,
) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(message.len() + 16);
    let mut seen = false;
    for field in fields(message)? {
        if field.tag == tag && field.wire_type == WireType::LengthDelimited {
            seen = true;
            if let Some(body) = rewrite(Some(field.body))? {
                put_length_delimited(&mut out, tag, &body);
            }
            continue;
        }
        if !seen && field.tag > tag {
            seen = true;
            if let Some(body) = rewrite(None)? {
                put_length_delimited(&mut out, tag, &body);
            }
        }
        out.extend_from_slice(field.raw);
    }
    if !seen {
        if let Some(body) = rewrite(None)? {
            put_length_delimited(&mut out, tag, &body);
        }
    }
    Ok(out)
}

/// Re-encode a graph with every waypoint record named `waypoint_id` relabelled.
///
/// All other bytes are carried over unchanged. An empty label removes the
/// name field, matching how an unset name is encoded.
pub fn relabel_waypoint(graph: &[u8], waypoint_id: &str, label: &str) -> Result<Vec<u8>> {
    let name = (!label.is_empty()).then(|| label.as_bytes().to_vec());

    let mut out = Vec::with_capacity(graph.len() + label.len());
    let mut matched = 0usize;
    for field in fields(graph)? {
        let is_waypoint =
            field.tag == GRAPH_WAYPOINTS && field.wire_type == WireType::LengthDelimited;
        if is_waypoint && proto::Waypoint::decode(field.body)?.id == waypoint_id {
            matched += 1;
            let waypoint = rewrite_field(field.body, WAYPOINT_ANNOTATIONS, |annotations| {
                let annotations = annotations.unwrap_or_default();
                rewrite_field(annotations, ANNOTATIONS_NAME, |_| Ok(name.clone())).map(Some)
            })?;
            put_length_delimited(&mut out, GRAPH_WAYPOINTS, &waypoint);
            continue;
        }
        out.extend_from_slice(field.raw);
    }

    if matched == 0 {
        return Err(Error::NotFound(format!("Waypoint {}", waypoint_id)));
    }
    Ok(out)
}
