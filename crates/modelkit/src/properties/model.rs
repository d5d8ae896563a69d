//! Property support for owner types.
//!
//! Implement [`Model`] on a struct that holds a [`PropertiesManager`] and it
//! gains `get` / `set` / `isset` / `unset` plus freezing and export, all
//! routed through the manager. Code inside the owner's own methods uses the
//! `*_inner` variants, which run in the owner's scope.

use super::manager::{Caller, PropertiesManager};
use crate::error::Result;
use crate::value::Value;

pub trait Model {
    fn properties(&self) -> &PropertiesManager;

    fn properties_mut(&mut self) -> &mut PropertiesManager;

    fn get(&mut self, name: &str) -> Result<Value> {
        self.properties_mut().get(name)
    }

    fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()>
    where
        Self: Sized,
    {
        self.properties_mut().set(name, value)
    }

    fn isset(&mut self, name: &str) -> Result<bool> {
        self.properties_mut().isset(name)
    }

    fn unset(&mut self, name: &str) -> Result<()> {
        self.properties_mut().unset(name)
    }

    /// Read from inside the owner's scope.
    fn get_inner(&mut self, name: &str) -> Result<Value> {
        let manager = self.properties_mut();
        let scope = manager.owner_scope().to_string();
        manager.get_as(Caller::Scope(&scope), name)
    }

    /// Write from inside the owner's scope.
    fn set_inner(&mut self, name: &str, value: impl Into<Value>) -> Result<()>
    where
        Self: Sized,
    {
        let manager = self.properties_mut();
        let scope = manager.owner_scope().to_string();
        manager.set_as(Caller::Scope(&scope), name, value)
    }

    /// Make the object immutable. Irreversible.
    fn freeze(&mut self) {
        self.properties_mut().set_all_as_readonly();
    }

    fn is_frozen(&self) -> bool {
        self.properties().is_readonly()
    }

    /// The persisted view as a JSON object.
    fn to_json(&mut self) -> Result<serde_json::Value> {
        Ok(serde_json::Value::Object(self.properties_mut().export()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::properties::{Converter, ManagerMode, Owner, PropertyDecl, TypeRule};
    use crate::value::ValueKind;

    #[derive(Debug, Clone)]
    struct Article {
        props: PropertiesManager,
    }

    impl Article {
        fn new(title: &str) -> Result<Self> {
            let mut props = PropertiesManager::new(Owner::new("Article"));
            props.initialize(
                vec![
                    PropertyDecl::new("title", TypeRule::strict(ValueKind::Str)),
                    PropertyDecl::new("views", TypeRule::coerce(Converter::Int)).default(0),
                    PropertyDecl::new("author", TypeRule::strict(ValueKind::Str)).read_only(),
                    PropertyDecl::new("draft", TypeRule::coerce(Converter::Bool))
                        .default(true)
                        .transient(),
                ],
                ManagerMode::Mutable,
                false,
            )?;
            let mut article = Self { props };
            article.set("title", title)?;
            article.set_inner("author", "system")?;
            Ok(article)
        }
    }

    impl Model for Article {
        fn properties(&self) -> &PropertiesManager {
            &self.props
        }

        fn properties_mut(&mut self) -> &mut PropertiesManager {
            &mut self.props
        }
    }

    #[test]
    fn owner_scope_can_write_read_only() {
        let mut article = Article::new("Intro").unwrap();
        assert_eq!(article.get("author").unwrap(), Value::from("system"));
        assert!(matches!(
            article.set("author", "me"),
            Err(ModelError::Inaccessible { .. })
        ));
        assert_eq!(article.get_inner("title").unwrap(), Value::from("Intro"));
    }

    #[test]
    fn freeze_after_construction() {
        let mut article = Article::new("Intro").unwrap();
        article.freeze();
        assert!(article.is_frozen());
        assert!(matches!(
            article.set("views", 3),
            Err(ModelError::Immutable { .. })
        ));
        assert!(matches!(
            article.set_inner("author", "x"),
            Err(ModelError::Immutable { .. })
        ));
    }

    #[test]
    fn to_json_skips_transient() {
        let mut article = Article::new("Intro").unwrap();
        article.set("views", "12").unwrap();
        assert_eq!(
            article.to_json().unwrap(),
            serde_json::json!({"title": "Intro", "views": 12, "author": "system"})
        );
    }

    #[test]
    fn cloned_owner_is_independent() {
        let mut first = Article::new("Intro").unwrap();
        let mut second = first.clone();
        second.set("title", "Copy").unwrap();
        second.freeze();

        assert_eq!(first.get("title").unwrap(), Value::from("Intro"));
        assert!(!first.is_frozen());
        first.set("views", 1).unwrap();
    }

    #[test]
    fn isset_and_unset() {
        let mut article = Article::new("Intro").unwrap();
        assert!(article.isset("views").unwrap());
        article.unset("title").unwrap();
        assert!(!article.isset("title").unwrap());
    }
}
