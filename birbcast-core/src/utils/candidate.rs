use crate::model::TransportPolicy;

/// True for `candidate:` lines describing a UDP relay (TURN) candidate.
///
/// Accepts the line with or without the `a=` sdp attribute prefix.
pub fn is_udp_relay_candidate(candidate: &str) -> bool {
    let line = candidate.trim();
    let line = line.strip_prefix("a=").unwrap_or(line);
    if !line.starts_with("candidate:") {
        return false;
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    let transport = fields.get(2).copied().unwrap_or_default();
    let typ = fields
        .iter()
        .position(|f| *f == "typ")
        .and_then(|i| fields.get(i + 1))
        .copied()
        .unwrap_or_default();

    transport.eq_ignore_ascii_case("udp") && typ == "relay"
}

pub fn admits_candidate(policy: TransportPolicy, candidate: &str) -> bool {
    match policy {
        TransportPolicy::Any => true,
        TransportPolicy::RelayOnly => is_udp_relay_candidate(candidate),
    }
}

/// Drops every `a=candidate:` line the policy does not admit.
pub fn filter_sdp_candidates(sdp: &str, policy: TransportPolicy) -> String {
    if policy == TransportPolicy::Any {
        return sdp.to_string();
    }

    sdp.split_inclusive('\n')
        .filter(|line| {
            let bare = line.trim_end();
            !bare.starts_with("a=candidate:") || admits_candidate(policy, bare)
        })
        .collect()
}
