use once_cell::sync::Lazy;
use rand::Rng;
use serde::Deserialize;

/// One predefined query with `?` placeholders bound positionally from an
/// input row.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct QueryTemplate {
    pub name: String,
    pub query: String,
}

impl QueryTemplate {
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.query.matches('?').count()
    }
}

static DEFAULT_TEMPLATES: Lazy<Vec<QueryTemplate>> = Lazy::new(|| {
    vec![
        QueryTemplate {
            name: "recent_events".to_owned(),
            query: "SELECT event_id, count() AS hits, min(created_at) AS first_seen, \
                    max(updated_at) AS last_seen FROM events \
                    WHERE tenant_id = ? AND visitor_id = ? GROUP BY event_id"
                .to_owned(),
        },
        QueryTemplate {
            name: "last_session".to_owned(),
            query: "SELECT created_at, updated_at FROM sessions \
                    WHERE tenant_id = ? AND visitor_id = ? \
                    ORDER BY updated_at DESC LIMIT 1"
                .to_owned(),
        },
        QueryTemplate {
            name: "visitor_attributes".to_owned(),
            query: "SELECT * FROM attributes WHERE tenant_id = ? AND visitor_id = ?".to_owned(),
        },
    ]
});

/// The built-in read-path template set, used when the config file does not
/// supply its own.
#[must_use]
pub fn default_templates() -> Vec<QueryTemplate> {
    DEFAULT_TEMPLATES.clone()
}

/// Picks which template the next request uses. Injectable so tests can pin
/// the sequence.
pub trait TemplateChooser: Send + Sync {
    fn choose(&self, count: usize) -> usize;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UniformChooser;

impl TemplateChooser for UniformChooser {
    fn choose(&self, count: usize) -> usize {
        if count <= 1 {
            return 0;
        }
        rand::thread_rng().gen_range(0..count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_count_counts_question_marks() {
        let template = QueryTemplate {
            name: "t".to_owned(),
            query: "SELECT 1 WHERE a = ? AND b = ?".to_owned(),
        };
        assert_eq!(template.placeholder_count(), 2);
    }

    #[test]
    fn default_templates_bind_two_parameters_each() {
        let templates = default_templates();
        assert_eq!(templates.len(), 3);
        for template in &templates {
            assert_eq!(template.placeholder_count(), 2, "{}", template.name);
        }
    }

    #[test]
    fn uniform_chooser_stays_in_range() {
        let chooser = UniformChooser;
        for _ in 0..100 {
            assert!(chooser.choose(3) < 3);
        }
        assert_eq!(chooser.choose(1), 0);
        assert_eq!(chooser.choose(0), 0);
    }
}
