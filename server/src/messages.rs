//! Flavor text announced when a mine claims a victim
//!
//! Templates are plain lines that may contain `%owner%`, `%victim%`,
//! `%defuser%` and `%minecount%`. A bank may legitimately be empty; callers
//! then fall back to a fixed notice sent only to the players involved.

use crate::error::MessageError;
use log::{info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};

/// Somewhere a list of templates can be read from.
pub trait MessageSource {
    fn load_lines(&self) -> Result<Vec<String>, MessageError>;

    fn describe(&self) -> String;
}

/// One template per line of a text file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl MessageSource for FileSource {
    fn load_lines(&self) -> Result<Vec<String>, MessageError> {
        let text = fs::read_to_string(&self.path).map_err(|error| MessageError::Io {
            source: self.describe(),
            error,
        })?;
        Ok(text.lines().map(str::to_string).collect())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Values substituted into a template.
#[derive(Debug, Clone, Default)]
pub struct Bindings<'a> {
    pub owner: &'a str,
    pub victim: &'a str,
    pub defuser: Option<&'a str>,
    pub mine_count: usize,
}

#[derive(Debug, Default)]
pub struct MessageBank {
    templates: Vec<String>,
}

impl MessageBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_templates(templates: Vec<String>) -> Self {
        Self { templates }
    }

    /// Replaces the templates with the source's lines, skipping blank ones.
    ///
    /// The new list is swapped in only once it has been read completely; on
    /// failure the current list is kept and the error is logged and
    /// returned.
    pub fn reload(&mut self, source: &dyn MessageSource) -> Result<usize, MessageError> {
        match source.load_lines() {
            Ok(lines) => {
                let templates: Vec<String> = lines
                    .into_iter()
                    .map(|line| line.trim().to_string())
                    .filter(|line| !line.is_empty())
                    .collect();
                info!("Loaded {} messages from {}", templates.len(), source.describe());
                self.templates = templates;
                Ok(self.templates.len())
            }
            Err(e) => {
                warn!("Keeping {} messages: {}", self.templates.len(), e);
                Err(e)
            }
        }
    }

    pub fn pick_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.templates.choose(rng).map(String::as_str)
    }

    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Substitutes placeholders in one left-to-right pass. Unknown placeholders,
/// and `%defuser%` without a defuser, are kept as written.
pub fn render(template: &str, bindings: &Bindings) -> String {
    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let replacement = after.find('%').and_then(|end| {
            let value = match &after[..end] {
                "owner" => Some(bindings.owner.to_string()),
                "victim" => Some(bindings.victim.to_string()),
                "defuser" => bindings.defuser.map(str::to_string),
                "minecount" => Some(bindings.mine_count.to_string()),
                _ => None,
            };
            value.map(|value| (value, end))
        });

        match replacement {
            Some((value, end)) => {
                out.push_str(&value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('%');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// The detonation lines the plugin shipped with before messages could be
/// loaded from a file.
pub fn classic_detonation_templates() -> Vec<String> {
    [
        "%victim% was killed by %owner%'s mine. [%minecount%]",
        "%victim% was owned by %owner%'s mine. [%minecount%]",
        "%victim% was obliterated by %owner%'s mine. [%minecount%]",
        "%victim%'s tank disintegrated from %owner%'s mine. [%minecount%]",
        "%victim% was permanently blinded by the bright light from %owner%'s mine. [%minecount%]",
        "%victim% was sent shooting into the stars by %owner%'s mine. [%minecount%]",
        "%victim% was never heard from again thanks to %owner%'s mine. [%minecount%]",
        "We salute %victim% for taking an atrocious hit from %owner%'s mine. [%minecount%]",
        "%owner%'s mine left %victim%'s tank parts scattered all over. [%minecount%]",
        "%victim% thought %owner%'s mine was a shiny brand new car. [%minecount%]",
        "%victim% was bombarded by many concussive attacks from %owner%'s mine. [%minecount%]",
        "%victim% was ignited by %owner%'s mine. [%minecount%]",
        "%owner%'s mine bursted %victim%'s tank to bite-size flaming pieces. [%minecount%]",
        "%victim% took a nosedive into %owner%'s mine. [%minecount%]",
        "%victim% fell face first into %owner%'s mine. [%minecount%]",
        "I knew %victim% would be clumsy enough to run into %owner%'s mine. [%minecount%]",
        "%owner% killed %victim% with a mine. No surprise there. [%minecount%]",
        "DID YOU SEE THAT? %owner% did total carnage to %victim%'s tank with that one little mine. [%minecount%]",
        "%victim% purposely ran into %owner%'s mine. [%minecount%]",
        "I ascertain that %victim% has been ruptured by a mine created from the heavens with the name dubbed %owner%. [%minecount%]",
    ]
    .iter()
    .map(|line| line.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::io;

    struct StaticSource(Vec<&'static str>);

    impl MessageSource for StaticSource {
        fn load_lines(&self) -> Result<Vec<String>, MessageError> {
            Ok(self.0.iter().map(|line| line.to_string()).collect())
        }

        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    struct BrokenSource;

    impl MessageSource for BrokenSource {
        fn load_lines(&self) -> Result<Vec<String>, MessageError> {
            Err(MessageError::Io {
                source: self.describe(),
                error: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            })
        }

        fn describe(&self) -> String {
            "broken".to_string()
        }
    }

    fn bindings() -> Bindings<'static> {
        Bindings {
            owner: "alice",
            victim: "bob",
            defuser: None,
            mine_count: 3,
        }
    }

    #[test]
    fn test_render_all_placeholders() {
        let b = Bindings {
            defuser: Some("carol"),
            ..bindings()
        };
        assert_eq!(
            render("%victim% hit %owner%'s mine, %defuser% watched [%minecount%]", &b),
            "bob hit alice's mine, carol watched [3]"
        );
    }

    #[test]
    fn test_render_repeated_placeholder() {
        assert_eq!(render("%owner% %owner%", &bindings()), "alice alice");
    }

    #[test]
    fn test_render_unknown_placeholder_is_literal() {
        assert_eq!(render("100% %killer% %victim%", &bindings()), "100% %killer% bob");
        assert_eq!(render("50%", &bindings()), "50%");
        assert_eq!(render("%%owner%", &bindings()), "%alice");
    }

    #[test]
    fn test_render_missing_defuser_is_literal() {
        assert_eq!(render("%defuser% saved %victim%", &bindings()), "%defuser% saved bob");
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let b = Bindings {
            owner: "%victim%",
            ..bindings()
        };
        assert_eq!(render("%owner% vs %victim%", &b), "%victim% vs bob");
    }

    #[test]
    fn test_pick_random_empty() {
        let bank = MessageBank::new();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(bank.is_empty());
        assert_eq!(bank.pick_random(&mut rng), None);
    }

    #[test]
    fn test_pick_random_covers_bank() {
        let bank = MessageBank::with_templates(vec!["a".into(), "b".into(), "c".into()]);
        let mut rng = StdRng::seed_from_u64(7);

        let seen: HashSet<&str> = (0..200).filter_map(|_| bank.pick_random(&mut rng)).collect();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_reload_replaces_and_skips_blank_lines() {
        let mut bank = MessageBank::with_templates(vec!["old".into()]);

        let loaded = bank
            .reload(&StaticSource(vec!["first", "", "  second  ", "   "]))
            .unwrap();

        assert_eq!(loaded, 2);
        assert_eq!(bank.templates(), &["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_reload_failure_keeps_previous_list() {
        let mut bank = MessageBank::with_templates(vec!["keep me".into()]);

        let result = bank.reload(&BrokenSource);

        assert!(matches!(result, Err(MessageError::Io { .. })));
        assert_eq!(bank.templates(), &["keep me".to_string()]);
    }

    #[test]
    fn test_reload_missing_file_keeps_previous_list() {
        let mut bank = MessageBank::with_templates(vec!["keep me".into()]);
        let missing = std::env::temp_dir().join("uselessmine-no-such-file.txt");

        assert!(bank.reload(&FileSource::new(&missing)).is_err());
        assert_eq!(bank.len(), 1);
    }

    #[test]
    fn test_reload_from_file() {
        let path = std::env::temp_dir().join(format!("uselessmine-messages-{}.txt", std::process::id()));
        fs::write(&path, "%victim% met %owner%'s mine\n\n%owner% strikes again\n").unwrap();

        let mut bank = MessageBank::new();
        let loaded = bank.reload(&FileSource::new(&path)).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(loaded, 2);
        assert_eq!(bank.templates()[1], "%owner% strikes again");
    }

    #[test]
    fn test_classic_templates_render_cleanly() {
        let templates = classic_detonation_templates();
        assert_eq!(templates.len(), 20);

        for template in &templates {
            let text = render(template, &bindings());
            assert!(!text.contains('%'), "unrendered placeholder in {}", text);
            assert!(text.contains("alice") && text.contains("bob"));
            assert!(text.ends_with("[3]"));
        }
    }
}
