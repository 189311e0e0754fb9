//! Property-based wire framing tests.
//!
//! Uses proptest to verify:
//! 1. Any request survives encode → decode round-trip through the framing.
//! 2. Any response, including arbitrary extra fields, round-trips.
//! 3. Random bytes never cause a panic in the decoders (they return `Err`
//!    or report a short frame gracefully).
//! 4. The length prefix always matches the payload length, big-endian.

use proptest::prelude::*;

use chatline_proto::codec;
use chatline_proto::request::Request;
use chatline_proto::response::{Response, Status};

// --- Strategies for protocol values ---

/// Strategy for usernames and other short text fields. Excludes NUL to keep
/// the generated JSON printable in failure reports.
fn arb_text() -> impl Strategy<Value = String> {
    "[^\x00]{0,64}"
}

/// Strategy for arbitrary requests covering every variant that carries
/// interesting payload shapes.
fn arb_request() -> impl Strategy<Value = Request> {
    prop_oneof![
        (arb_text(), arb_text()).prop_map(|(username, password)| Request::Register {
            username,
            password
        }),
        (arb_text(), arb_text()).prop_map(|(username, password)| Request::Login {
            username,
            password
        }),
        (any::<i64>(), arb_text())
            .prop_map(|(user_id, username)| Request::GetChats { user_id, username }),
        any::<i64>().prop_map(|chat_id| Request::GetMessages { chat_id }),
        (any::<i64>(), any::<i64>(), arb_text()).prop_map(|(user_id, chat_id, text)| {
            Request::SendMessage {
                user_id,
                chat_id,
                text,
            }
        }),
        (
            any::<i64>(),
            prop::collection::vec(any::<i64>(), 0..8),
            prop::option::of(any::<bool>()),
            prop::option::of(arb_text()),
        )
            .prop_map(|(user_id, participant_ids, is_group, name)| Request::CreateChat {
                user_id,
                participant_ids,
                is_group,
                name,
            }),
        any::<bool>().prop_map(|force_update| Request::GetUsers { force_update }),
        (any::<i64>(), arb_text(), any::<i64>()).prop_map(|(chat_id, new_name, user_id)| {
            Request::UpdateChatName {
                chat_id,
                new_name,
                user_id,
            }
        }),
        (any::<i64>(), any::<i64>(), any::<i64>()).prop_map(
            |(chat_id, user_id, participant_id)| Request::AddParticipant {
                chat_id,
                user_id,
                participant_id,
            }
        ),
    ]
}

/// Strategy for responses with an arbitrary extra field set.
fn arb_response() -> impl Strategy<Value = Response> {
    (
        any::<bool>(),
        prop::option::of(arb_text()),
        // Keys are prefixed so they can never collide with the reserved
        // `status` and `message` fields the extras are flattened next to.
        prop::collection::btree_map("x_[a-z_]{1,14}", any::<i64>(), 0..6),
    )
        .prop_map(|(ok, message, extras)| {
            let mut response = if ok {
                Response::success()
            } else {
                Response::error(message.clone().unwrap_or_default())
            };
            if let Some(message) = message {
                response = response.with_message(message);
            }
            for (key, value) in extras {
                response = response.with_field(&key, value);
            }
            response
        })
}

proptest! {
    /// Requests survive a full frame round-trip byte-for-byte in meaning.
    #[test]
    fn request_frame_round_trip(request in arb_request()) {
        let frame = codec::encode_frame(&request).unwrap();
        let (decoded, consumed): (Request, usize) = codec::decode_frame(&frame).unwrap();
        prop_assert_eq!(consumed, frame.len());
        prop_assert_eq!(decoded, request);
    }

    /// Responses, including arbitrary flattened fields, round-trip.
    #[test]
    fn response_frame_round_trip(response in arb_response()) {
        let frame = codec::encode_frame(&response).unwrap();
        let (decoded, _): (Response, usize) = codec::decode_frame(&frame).unwrap();
        prop_assert_eq!(decoded.status, response.status);
        prop_assert_eq!(decoded.message.clone(), response.message.clone());
        prop_assert_eq!(decoded.fields, response.fields);
    }

    /// The four prefix bytes are always the big-endian payload length.
    #[test]
    fn prefix_is_big_endian_payload_length(request in arb_request()) {
        let frame = codec::encode_frame(&request).unwrap();
        let payload_len = frame.len() - 4;
        prop_assert_eq!(&frame[..4], &u32::try_from(payload_len).unwrap().to_be_bytes());
    }

    /// Random bytes never panic the payload decoder.
    #[test]
    fn random_bytes_never_panic_payload_decode(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _: Result<Request, _> = codec::decode_payload(&bytes);
    }

    /// Random bytes never panic the request parser; every outcome is a
    /// typed error or a valid request.
    #[test]
    fn random_bytes_never_panic_request_parse(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = Request::parse(&bytes);
    }

    /// Random bytes never panic the frame decoder.
    #[test]
    fn random_bytes_never_panic_frame_decode(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let _: Result<(Request, usize), _> = codec::decode_frame(&bytes);
    }

    /// Two frames written back to back decode independently and in order.
    #[test]
    fn concatenated_frames_decode_in_order(a in arb_request(), b in arb_request()) {
        let mut stream = codec::encode_frame(&a).unwrap();
        stream.extend_from_slice(&codec::encode_frame(&b).unwrap());

        let (first, consumed): (Request, usize) = codec::decode_frame(&stream).unwrap();
        let (second, _): (Request, usize) = codec::decode_frame(&stream[consumed..]).unwrap();
        prop_assert_eq!(first, a);
        prop_assert_eq!(second, b);
    }
}
