//! Visitor classification from request metadata.

use sha2::{Digest, Sha256};
use woothee::parser::Parser;

use crate::domain::entities::DeviceType;

const CONSOLE_MARKERS: [&str; 3] = ["nintendo", "playstation", "xbox"];
const TV_MARKERS: [&str; 9] = [
    "smart-tv",
    "smarttv",
    "hbbtv",
    "tizen",
    "webos",
    "android tv",
    "googletv",
    "bravia",
    "crkey",
];
const WEARABLE_MARKERS: [&str; 5] = ["watchos", "apple watch", "wear os", "smartwatch", "wearable"];

/// Classifies a user agent into a [`DeviceType`].
///
/// Unknown or unparsable agents fall back to desktop, except Apple devices
/// woothee cannot place, which are treated as mobile.
pub fn classify_device(user_agent: &str) -> DeviceType {
    let lowered = user_agent.to_ascii_lowercase();

    // TV and console agents often carry "android" without "mobile".
    if TV_MARKERS.iter().any(|m| lowered.contains(m)) {
        return DeviceType::SmartTv;
    }
    if CONSOLE_MARKERS.iter().any(|m| lowered.contains(m)) {
        return DeviceType::Console;
    }
    if WEARABLE_MARKERS.iter().any(|m| lowered.contains(m)) {
        return DeviceType::Wearable;
    }
    if lowered.contains("ipad") || (lowered.contains("android") && !lowered.contains("mobile")) {
        return DeviceType::Tablet;
    }

    let Some(result) = Parser::new().parse(user_agent) else {
        return DeviceType::Desktop;
    };

    match result.category {
        "smartphone" | "mobilephone" => DeviceType::Mobile,
        "pc" => DeviceType::Desktop,
        "appliance" => DeviceType::SmartTv,
        _ if result.vendor == "Apple" => DeviceType::Mobile,
        _ => DeviceType::Desktop,
    }
}

/// One-way visitor fingerprint: hex SHA-256 of `ip + user_agent`.
///
/// Only used for distinct-visitor counting.
pub fn visitor_fingerprint(ip: &str, user_agent: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    hasher.update(user_agent.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const IPAD: &str = "Mozilla/5.0 (iPad; CPU OS 16_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1";
    const WINDOWS_CHROME: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const PLAYSTATION: &str = "Mozilla/5.0 (PlayStation 4 3.11) AppleWebKit/537.73 (KHTML, like Gecko)";

    #[test]
    fn test_classify_common_agents() {
        assert_eq!(classify_device(IPHONE), DeviceType::Mobile);
        assert_eq!(classify_device(IPAD), DeviceType::Tablet);
        assert_eq!(classify_device(WINDOWS_CHROME), DeviceType::Desktop);
        assert_eq!(classify_device(PLAYSTATION), DeviceType::Console);
        assert_eq!(
            classify_device("Mozilla/5.0 (SMART-TV; Linux; Tizen 6.0) AppleWebKit/537.36"),
            DeviceType::SmartTv
        );
    }

    #[test]
    fn test_android_tv_is_not_a_tablet() {
        let android_tv = "Mozilla/5.0 (Linux; Android 9; BRAVIA 4K GB ATV3 Build/PTT1.190515.001.S52) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0.4664.104 Safari/537.36";
        let google_tv = "Mozilla/5.0 (Linux; Android 12; Chromecast HD; Android TV) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/110.0 Safari/537.36";
        let android_tablet = "Mozilla/5.0 (Linux; Android 13; SM-X710) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0 Safari/537.36";

        assert_eq!(classify_device(android_tv), DeviceType::SmartTv);
        assert_eq!(classify_device(google_tv), DeviceType::SmartTv);
        assert_eq!(classify_device(android_tablet), DeviceType::Tablet);
    }

    #[test]
    fn test_watch_matching_is_narrow() {
        assert_eq!(
            classify_device("Mozilla/5.0 (Apple Watch; CPU watchOS 10_0 like Mac OS X)"),
            DeviceType::Wearable
        );
        // A browser extension named "watcher" is not a wearable.
        assert_eq!(
            classify_device(&format!("{WINDOWS_CHROME} PriceWatcher/2.1")),
            DeviceType::Desktop
        );
    }

    #[test]
    fn test_unknown_agent_defaults_to_desktop() {
        assert_eq!(classify_device(""), DeviceType::Desktop);
        assert_eq!(classify_device("unknown"), DeviceType::Desktop);
        assert_eq!(classify_device("curl/8.4.0"), DeviceType::Desktop);
    }

    #[test]
    fn test_fingerprint_is_stable_hex() {
        let a = visitor_fingerprint("203.0.113.7", IPHONE);
        let b = visitor_fingerprint("203.0.113.7", IPHONE);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, visitor_fingerprint("203.0.113.8", IPHONE));
        assert_ne!(a, visitor_fingerprint("203.0.113.7", WINDOWS_CHROME));
    }
}
