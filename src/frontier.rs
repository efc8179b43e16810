//! Text codec for frontiers and the history log.
//!
//! A frontier is a set of `(counter, peer)` markers. One marker encodes
//! as `counter@peer`, markers join with `,`, and log entries join with
//! `;`. Peers and counters are plain integers by the engine's contract,
//! so no escaping is needed. The empty string decodes to an empty log.

use loro::{Frontiers, ID};

use crate::error::{SyncError, SyncResult};

/// Encode a single frontier.
pub fn encode_frontiers(frontiers: &Frontiers) -> String {
    frontiers
        .iter()
        .map(|id| format!("{}@{}", id.counter, id.peer))
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode a single frontier. The input must contain at least one marker.
pub fn decode_frontiers(text: &str) -> SyncResult<Frontiers> {
    let mut ids = Vec::new();
    for entry in text.split(',') {
        let (counter, peer) = entry
            .split_once('@')
            .ok_or_else(|| SyncError::MalformedFrontier(entry.to_string()))?;
        let counter: i32 = counter
            .parse()
            .map_err(|_| SyncError::MalformedFrontier(entry.to_string()))?;
        let peer: u64 = peer
            .parse()
            .map_err(|_| SyncError::MalformedFrontier(entry.to_string()))?;
        ids.push(ID::new(peer, counter));
    }
    Ok(Frontiers::from(ids))
}

/// Encode a whole history log.
pub fn encode_log(log: &[Frontiers]) -> String {
    log.iter()
        .map(encode_frontiers)
        .collect::<Vec<_>>()
        .join(";")
}

/// Decode a whole history log.
pub fn decode_log(text: &str) -> SyncResult<Vec<Frontiers>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split(';').map(decode_frontiers).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_frontier_roundtrip() {
        let f = Frontiers::from(vec![ID::new(12345678901234567890, 42)]);
        let text = encode_frontiers(&f);
        assert_eq!(text, "42@12345678901234567890");
        assert_eq!(decode_frontiers(&text).unwrap(), f);
    }

    #[test]
    fn test_multi_peer_frontier_roundtrip() {
        let f = Frontiers::from(vec![ID::new(1, 10), ID::new(2, 20)]);
        let decoded = decode_frontiers(&encode_frontiers(&f)).unwrap();
        assert_eq!(decoded, f);
    }

    #[test]
    fn test_log_roundtrip() {
        let log = vec![
            Frontiers::from(vec![ID::new(7, 0)]),
            Frontiers::from(vec![ID::new(7, 3), ID::new(9, 1)]),
            Frontiers::from(vec![ID::new(9, 5)]),
        ];
        let text = encode_log(&log);
        assert_eq!(decode_log(&text).unwrap(), log);
    }

    #[test]
    fn test_empty_string_is_empty_log() {
        assert!(decode_log("").unwrap().is_empty());
        assert_eq!(encode_log(&[]), "");
    }

    #[test]
    fn test_malformed_entries_are_rejected() {
        assert!(matches!(
            decode_frontiers("3"),
            Err(SyncError::MalformedFrontier(_))
        ));
        assert!(matches!(
            decode_frontiers("x@1"),
            Err(SyncError::MalformedFrontier(_))
        ));
        assert!(matches!(
            decode_frontiers("1@abc"),
            Err(SyncError::MalformedFrontier(_))
        ));
        assert!(decode_log("3@1;nope").is_err());
    }
}
