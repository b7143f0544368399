use super::types::{AddressEntry, Role};

/// Extract the organization identifier from an email address: the text
/// strictly between the first `@` and the next `.` after it.
///
/// Malformed addresses (no `@`, or no `.` following it) resolve to an
/// empty identifier rather than an error; data quality is reported by the
/// `check_dataset` binary, never by aborting the batch.
pub fn org_of_address(address: &str) -> String {
    let Some(at) = address.find('@') else {
        return String::new();
    };
    let domain = &address[at + 1..];
    let Some(dot) = domain.find('.') else {
        return String::new();
    };
    domain[..dot].to_string()
}

/// Resolve one record's address list into the sending organization and the
/// distinct receiving organizations, in order of first appearance.
///
/// If the sender also shows up as a receiver (the focal organization
/// cc'ing itself on outgoing mail) and there is more than one receiver
/// organization, the sender's entry is dropped from the receiver list:
/// a self-cc carries no correspondence information. A lone receiver is
/// always kept, even when it equals the sender.
pub fn classify_addresses(addresses: &[AddressEntry]) -> (String, Vec<String>) {
    let mut sender = String::new();
    let mut receivers: Vec<String> = Vec::new();

    for entry in addresses {
        let org = org_of_address(&entry.address);
        match entry.role {
            Role::Sender => sender = org,
            Role::Receiver => {
                if !receivers.contains(&org) {
                    receivers.push(org);
                }
            }
        }
    }

    if receivers.len() > 1 {
        if let Some(pos) = receivers.iter().position(|r| r == &sender) {
            receivers.remove(pos);
        }
    }

    (sender, receivers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(role: Role, address: &str) -> AddressEntry {
        AddressEntry {
            role,
            address: address.to_string(),
        }
    }

    #[test]
    fn test_org_of_address() {
        assert_eq!(org_of_address("anisha@workpatterns.com"), "workpatterns");
        assert_eq!(org_of_address("bob@acme.co.uk"), "acme");
        // Dots before the @ don't confuse resolution
        assert_eq!(org_of_address("first.last@orgx.com"), "orgx");
    }

    #[test]
    fn test_org_of_address_malformed() {
        assert_eq!(org_of_address("not-an-address"), "");
        assert_eq!(org_of_address("user@nodot"), "");
        assert_eq!(org_of_address(""), "");
    }

    #[test]
    fn test_classify_dedups_receivers() {
        let (sender, receivers) = classify_addresses(&[
            entry(Role::Sender, "a@orgx.com"),
            entry(Role::Receiver, "b@workpatterns.com"),
            entry(Role::Receiver, "c@workpatterns.com"),
        ]);
        assert_eq!(sender, "orgx");
        assert_eq!(receivers, vec!["workpatterns"]);
    }

    #[test]
    fn test_classify_drops_self_cc() {
        // Outgoing mail cc'ing an internal address alongside the real
        // recipient: the sender's own org disappears from the receivers.
        let (sender, receivers) = classify_addresses(&[
            entry(Role::Sender, "a@workpatterns.com"),
            entry(Role::Receiver, "b@orgx.com"),
            entry(Role::Receiver, "c@workpatterns.com"),
        ]);
        assert_eq!(sender, "workpatterns");
        assert_eq!(receivers, vec!["orgx"]);
    }

    #[test]
    fn test_classify_keeps_lone_receiver() {
        // A single receiver is kept even when it matches the sender.
        let (sender, receivers) = classify_addresses(&[
            entry(Role::Sender, "a@workpatterns.com"),
            entry(Role::Receiver, "b@workpatterns.com"),
        ]);
        assert_eq!(sender, "workpatterns");
        assert_eq!(receivers, vec!["workpatterns"]);
    }

    #[test]
    fn test_classify_sender_absent_from_receivers() {
        // Nothing is removed when the sender never appears as a receiver.
        let (sender, receivers) = classify_addresses(&[
            entry(Role::Sender, "a@orgx.com"),
            entry(Role::Receiver, "b@workpatterns.com"),
            entry(Role::Receiver, "c@orgy.com"),
        ]);
        assert_eq!(sender, "orgx");
        assert_eq!(receivers, vec!["workpatterns", "orgy"]);
    }

    #[test]
    fn test_classify_no_sender_entry() {
        let (sender, receivers) = classify_addresses(&[entry(Role::Receiver, "b@orgx.com")]);
        assert_eq!(sender, "");
        assert_eq!(receivers, vec!["orgx"]);
    }
}
