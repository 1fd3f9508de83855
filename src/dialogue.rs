//! Chat bubble formatting for dialogue lines
//!
//! Lines that start with a known speaker prefix ("Librarian: ...") become
//! chat bubbles; anything else passes through untouched. The content after
//! the prefix is inserted as-is, the engine has already rendered it to HTML.

/// Speaker class tokens double as CSS classes in the stylesheet
pub mod class {
    pub const SELF: &str = "me";
    pub const NARRATION: &str = "na";
    pub const FACILITATOR: &str = "cfa";
    pub const LIBRARIAN: &str = "cli";
    pub const ARCHIVIST: &str = "car";
    pub const SCHOLAR: &str = "csc";
    pub const HISTORIAN: &str = "chi";
    pub const CURATOR: &str = "ccu";
}

/// Who a prefix belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Speaker {
    /// Centered narration, no avatar
    Narration,
    /// The player, right-aligned
    Player,
    /// A named character with avatar and name header
    Character(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Prefix {
    literal: String,
    speaker: Speaker,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Profile {
    class: String,
    name: String,
    avatar: String,
}

/// Ordered prefix table plus per-character profiles
///
/// Matching goes in insertion order, so the first registered prefix wins
/// when two could match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixTable {
    prefixes: Vec<Prefix>,
    profiles: Vec<Profile>,
}

/// A classified line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueLine<'a> {
    Narration { content: &'a str },
    Player { content: &'a str },
    Character {
        class: &'a str,
        name: &'a str,
        avatar: &'a str,
        content: &'a str,
    },
    /// No prefix matched
    Plain(&'a str),
}

impl PrefixTable {
    pub fn builder() -> PrefixTableBuilder {
        PrefixTableBuilder::default()
    }

    /// The cast shipped with the story
    pub fn standard() -> Self {
        const AVATAR_BASE: &str = "https://images.unsplash.com/photo-";
        const AVATAR_CROP: &str = "?w=100&h=100&fit=crop&crop=face";
        let avatar = |id: &str| format!("{AVATAR_BASE}{id}{AVATAR_CROP}");

        Self::builder()
            .player("Me: ")
            .character("Facilitator: ", class::FACILITATOR, "Facilitator", &avatar("1507003211169-0a1dd7228f2d"))
            .character("Librarian: ", class::LIBRARIAN, "Librarian", &avatar("1494790108755-2616b612b786"))
            .character("Archivist: ", class::ARCHIVIST, "Archivist", &avatar("1472099645785-5658abf4ff4e"))
            .character("Scholar: ", class::SCHOLAR, "Scholar", &avatar("1500648767791-00dcc994a43e"))
            .character("Historian: ", class::HISTORIAN, "Historian", &avatar("1438761681033-6461ffad8d80"))
            .character("Curator: ", class::CURATOR, "Curator", &avatar("1519345182560-3f2917c472ef"))
            .narration("Narration: ")
            .build()
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    fn profile(&self, class: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.class == class)
    }

    /// Match a line against the table
    pub fn classify<'a>(&'a self, text: &'a str) -> DialogueLine<'a> {
        for prefix in &self.prefixes {
            let Some(content) = text.strip_prefix(prefix.literal.as_str()) else {
                continue;
            };
            return match &prefix.speaker {
                Speaker::Narration => DialogueLine::Narration { content },
                Speaker::Player => DialogueLine::Player { content },
                Speaker::Character(class) => {
                    let profile = self.profile(class);
                    DialogueLine::Character {
                        class,
                        name: profile.map(|p| p.name.as_str()).unwrap_or_default(),
                        avatar: profile.map(|p| p.avatar.as_str()).unwrap_or_default(),
                        content,
                    }
                }
            };
        }
        DialogueLine::Plain(text)
    }

    /// Classify and render in one go
    pub fn format_line(&self, text: &str) -> String {
        render(&self.classify(text))
    }
}

/// Builds a [`PrefixTable`] in the order prefixes are added
#[derive(Debug, Default)]
pub struct PrefixTableBuilder {
    table: PrefixTable,
}

impl PrefixTableBuilder {
    pub fn narration(mut self, literal: &str) -> Self {
        self.push(literal, Speaker::Narration);
        self
    }

    pub fn player(mut self, literal: &str) -> Self {
        self.push(literal, Speaker::Player);
        self
    }

    pub fn character(mut self, literal: &str, class: &str, name: &str, avatar: &str) -> Self {
        self.push(literal, Speaker::Character(class.to_string()));
        if self.table.profile(class).is_none() {
            self.table.profiles.push(Profile {
                class: class.to_string(),
                name: name.to_string(),
                avatar: avatar.to_string(),
            });
        }
        self
    }

    /// A character prefix with no profile; renders with blank name and avatar
    pub fn unprofiled(mut self, literal: &str, class: &str) -> Self {
        self.push(literal, Speaker::Character(class.to_string()));
        self
    }

    fn push(&mut self, literal: &str, speaker: Speaker) {
        self.table.prefixes.push(Prefix {
            literal: literal.to_string(),
            speaker,
        });
    }

    pub fn build(self) -> PrefixTable {
        self.table
    }
}

/// Markup for a classified line
pub fn render(line: &DialogueLine<'_>) -> String {
    match line {
        DialogueLine::Narration { content } => format!(
            r#"<div class="chat-line narration"><div class="bubble {na}">{content}</div></div>"#,
            na = class::NARRATION,
        ),
        DialogueLine::Player { content } => format!(
            r#"<div class="chat-line {me}"><div class="bubble {me}">{content}</div><span class="profile {me}">Me</span></div>"#,
            me = class::SELF,
        ),
        DialogueLine::Character {
            class,
            name,
            avatar,
            content,
        } => format!(
            concat!(
                r#"<div class="chat-line">"#,
                r#"<span class="profile {class}"><img src="{avatar}" alt="{name}" /></span>"#,
                r#"<div class="bubble {class}"><div class="bubble-sender-name {class}">{name}</div>{content}</div>"#,
                r#"</div>"#,
            ),
            class = class,
            avatar = avatar,
            name = name,
            content = content,
        ),
        DialogueLine::Plain(text) => (*text).to_string(),
    }
}

/// Format a line with the standard cast
pub fn format_line(text: &str) -> String {
    thread_local! {
        static STANDARD: PrefixTable = PrefixTable::standard();
    }
    STANDARD.with(|table| table.format_line(text))
}
