//! Deployment profiles.
//!
//! A profile is a named subset of the Mailjet API: the server exposes only
//! the tools whose identifier starts with one of the profile's prefixes. The
//! `mailjet` profile has no prefixes and exposes every tool.

/// A named tool-prefix allowlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolProfile {
    /// Server name advertised to clients.
    pub name: &'static str,
    pub description: &'static str,
    /// Tool identifier prefixes; empty means every tool.
    pub prefixes: &'static [&'static str],
}

impl ToolProfile {
    /// Look a profile up by key (`contacts`) or full name (`mailjet-contacts`).
    pub fn find(key: &str) -> Option<&'static ToolProfile> {
        let key = key.trim().to_ascii_lowercase();
        let full = if key.starts_with("mailjet") {
            key
        } else {
            format!("mailjet-{key}")
        };
        PROFILES.iter().find(|profile| profile.name == full)
    }

    /// Every built-in profile.
    pub fn all() -> &'static [ToolProfile] {
        PROFILES
    }

    /// Whether this profile exposes the tool `tool_id`.
    pub fn allows(&self, tool_id: &str) -> bool {
        allows(self.prefixes, tool_id)
    }
}

impl Default for ToolProfile {
    fn default() -> Self {
        PROFILES[0]
    }
}

/// True when `prefixes` is empty or `tool_id` starts with one of them.
pub fn allows<S: AsRef<str>>(prefixes: &[S], tool_id: &str) -> bool {
    prefixes.is_empty() || prefixes.iter().any(|p| tool_id.starts_with(p.as_ref()))
}

static PROFILES: &[ToolProfile] = &[
    ToolProfile {
        name: "mailjet",
        description: "Mailjet MCP Server - The full Mailjet API",
        prefixes: &[],
    },
    ToolProfile {
        name: "mailjet-automation",
        description: "Automated email workflows and customer journeys",
        prefixes: &["get_v3_workflow", "post_v3_workflow", "get_v3_automation"],
    },
    ToolProfile {
        name: "mailjet-campaigns",
        description: "Mailjet Campaigns MCP Server - Manage email campaigns, drafts, and statistics",
        prefixes: &[
            "get_v3_campaign",
            "post_v3_campaign",
            "put_v3_campaign",
            "delete_v3_campaign",
            "get_v3_campaigndraft",
            "post_v3_campaigndraft",
            "put_v3_campaigndraft",
            "delete_v3_campaigndraft",
            "get_v3_campaignstatistics",
            "get_v3_campaignoverview",
            "get_v3_campaigngraphstatistics",
            "get_v3_campaignaggregate",
        ],
    },
    ToolProfile {
        name: "mailjet-contacts",
        description: "Mailjet Contacts MCP Server - Manage contacts, contact lists, and contact properties",
        prefixes: &[
            "get_v3_contact",
            "post_v3_contact",
            "put_v3_contact",
            "delete_v3_contact",
            "get_v3_contactslist",
            "post_v3_contactslist",
            "put_v3_contactslist",
            "delete_v3_contactslist",
            "get_v3_contactdata",
            "post_v3_contactdata",
            "put_v3_contactdata",
            "delete_v3_contactdata",
            "get_v3_contactmetadata",
            "post_v3_contactmetadata",
            "put_v3_contactmetadata",
            "delete_v3_contactmetadata",
            "get_v3_contactslistsignup",
        ],
    },
    ToolProfile {
        name: "mailjet-domains",
        description: "Domain management and validation for email sending",
        prefixes: &["get_v3_dns", "get_v3_dns_id"],
    },
    ToolProfile {
        name: "mailjet-events",
        description: "Event tracking for email delivery and engagement",
        prefixes: &["get_v3_eventcallbackurl", "get_v3_eventcallbackurl_id"],
    },
    ToolProfile {
        name: "mailjet-messages",
        description: "Message management for individual email messages",
        prefixes: &[
            "get_v3_message",
            "get_v3_message_id",
            "get_v3_messagehistory",
            "get_v3_messageinformation",
            "get_v3_messagesentstatistics",
            "get_v3_messagestate",
        ],
    },
    ToolProfile {
        name: "mailjet-segmentation",
        description: "Contact segmentation for targeted campaigns",
        prefixes: &["get_v3_contactfilter", "get_v3_contactfilter_id"],
    },
    ToolProfile {
        name: "mailjet-send-email",
        description: "Transactional email sending through Mailjet Send API",
        prefixes: &["post_v3_send", "post_v3_1_send"],
    },
    ToolProfile {
        name: "mailjet-senders",
        description: "Mailjet Senders MCP Server - Manage senders and sender statistics",
        prefixes: &[
            "get_v3_sender",
            "post_v3_sender",
            "put_v3_sender",
            "delete_v3_sender",
            "get_v3_senderstatistics",
            "get_v3_metasender",
            "post_v3_metasender",
            "put_v3_metasender",
            "delete_v3_metasender",
        ],
    },
    ToolProfile {
        name: "mailjet-settings",
        description: "API keys and user management for Mailjet accounts",
        prefixes: &[
            "get_v3_apikey",
            "get_v3_apikey_id",
            "get_v3_apikeyaccess",
            "get_v3_apikeyaccess_id",
            "get_v3_apikeyaccessgrantor",
            "get_v3_apikeyaccessgrantor_id",
            "get_v3_apikeytotals",
            "get_v3_apikeytotals_id",
            "get_v3_apitoken",
            "get_v3_apitoken_id",
            "get_v3_apppreferences",
            "get_v3_apppreferences_id",
        ],
    },
    ToolProfile {
        name: "mailjet-sms",
        description: "SMS messaging through Mailjet SMS API",
        prefixes: &["post_v4_sms", "get_v4_sms"],
    },
    ToolProfile {
        name: "mailjet-statistics",
        description: "Statistics and analytics for Mailjet campaigns and contacts",
        prefixes: &[
            "get_v3_activitycounters",
            "get_v3_aggregategraphstatistics",
            "get_v3_apikeytotals",
            "get_v3_bouncestatistics",
            "get_v3_clickstatistics",
            "get_v3_contactstatistics",
            "get_v3_domainstatistics",
            "get_v3_geostatistics",
            "get_v3_graphstatistics",
            "get_v3_listrecipientstatistics",
            "get_v3_liststatistics",
            "get_v3_messageinformation",
            "get_v3_messagesentstatistics",
            "get_v3_senderstatistics",
        ],
    },
    ToolProfile {
        name: "mailjet-templates",
        description: "Mailjet Templates MCP Server - Manage email templates and newsletter templates",
        prefixes: &[
            "get_v3_template",
            "post_v3_template",
            "put_v3_template",
            "delete_v3_template",
            "get_v3_newslettertemplate",
            "post_v3_newslettertemplate",
            "put_v3_newslettertemplate",
            "get_v3_newslettertemplatecategory",
        ],
    },
    ToolProfile {
        name: "mailjet-webhooks",
        description: "Webhook configuration for email event notifications",
        prefixes: &["get_v3_eventcallbackurl", "get_v3_eventcallbackurl_id"],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_key_and_full_name() {
        assert_eq!(ToolProfile::find("contacts").unwrap().name, "mailjet-contacts");
        assert_eq!(ToolProfile::find("mailjet-contacts").unwrap().name, "mailjet-contacts");
        assert_eq!(ToolProfile::find("send-email").unwrap().name, "mailjet-send-email");
        assert_eq!(ToolProfile::find(" SMS ").unwrap().name, "mailjet-sms");
        assert_eq!(ToolProfile::find("mailjet").unwrap().prefixes.len(), 0);
        assert!(ToolProfile::find("billing").is_none());
    }

    #[test]
    fn test_default_profile_allows_everything() {
        let profile = ToolProfile::default();
        assert_eq!(profile.name, "mailjet");
        assert!(profile.allows("get_v3_anything"));
    }

    #[test]
    fn test_prefix_filtering() {
        let contacts = ToolProfile::find("contacts").unwrap();
        assert!(contacts.allows("get_v3_contactslist_id"));
        assert!(!contacts.allows("get_v3_message"));

        let prefixes = vec!["get_v3_message".to_string()];
        assert!(allows(&prefixes, "get_v3_messagestate"));
        assert!(!allows(&prefixes, "get_v3_sender"));
    }

    #[test]
    fn test_profile_names_are_unique() {
        let mut names: Vec<_> = ToolProfile::all().iter().map(|p| p.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ToolProfile::all().len());
    }
}
