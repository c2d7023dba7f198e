//! Verify the resolver, serializer, and parser against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Each vector file describes inputs and expected outputs; failures carry the
//! case name so a broken vector is easy to find.

use termsage_core::{
    parse_response, serialize_request, Endpoint, ErrorKind, HttpMethod, HttpRequest, HttpResponse,
};

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn parse_kind(s: &str) -> ErrorKind {
    match s {
        "ConnectionClosed" => ErrorKind::ConnectionClosed,
        "Malformed" => ErrorKind::Malformed,
        other => panic!("unknown error kind: {other}"),
    }
}

fn pairs(value: &serde_json::Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

#[test]
fn endpoint_test_vectors() {
    let raw = include_str!("../../test-vectors/endpoints.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let explicit = case["explicit_port"].as_u64().map(|p| p as u16);
        let ep = Endpoint::parse(case["specifier"].as_str().unwrap(), explicit);
        assert_eq!(ep.host(), case["host"].as_str().unwrap(), "{name}: host");
        assert_eq!(u64::from(ep.port()), case["port"].as_u64().unwrap(), "{name}: port");
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let req = HttpRequest {
            method: parse_method(case["method"].as_str().unwrap()),
            path: case["path"].as_str().unwrap().to_string(),
            headers: pairs(&case["headers"]),
            body: case["body"].as_str().unwrap().as_bytes().to_vec(),
        };
        let bytes = serialize_request(case["host"].as_str().unwrap(), &req);
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            case["expected"].as_str().unwrap(),
            "{name}: wire bytes"
        );
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = case["raw"].as_str().unwrap().as_bytes();
        let expected_status = case["expected_status"].as_i64().unwrap() as i32;

        // The collapsing form always yields something, never panics.
        let lossy = HttpResponse::parse_or_invalid(input);
        assert_eq!(lossy.status, expected_status, "{name}: status");

        if let Some(expected_error) = case.get("expected_error") {
            let err = parse_response(input).unwrap_err();
            assert_eq!(err.kind(), parse_kind(expected_error.as_str().unwrap()), "{name}: kind");
            assert_eq!(lossy, HttpResponse::invalid(), "{name}: sentinel must be empty");
        } else {
            let res = parse_response(input).unwrap();
            assert_eq!(res, lossy, "{name}: both forms agree");
            assert_eq!(res.headers, pairs(&case["expected_headers"]), "{name}: headers");
            assert_eq!(
                res.body,
                case["expected_body"].as_str().unwrap().as_bytes(),
                "{name}: body"
            );
        }
    }
}
