//! Structured image references: `[registry/]repository[:tag|@digest]`.

use std::fmt;

use crate::dockerfile::error::{Error, Result};

/// A parsed image reference. Tag and digest are mutually exclusive; the
/// setters enforce the invariant before any mutation happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageName {
    registry: Option<String>,
    repository: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl ImageName {
    pub fn create(repository: impl Into<String>) -> Result<Self> {
        let repository = repository.into();
        if repository.is_empty() {
            return Err(Error::InvalidArgument(
                "repository may not be empty".to_string(),
            ));
        }
        Ok(ImageName {
            registry: None,
            repository,
            tag: None,
            digest: None,
        })
    }

    /// Parses a textual image reference.
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(Error::InvalidArgument(
                "image name may not be empty".to_string(),
            ));
        }
        let (name, digest) = match text.split_once('@') {
            Some((name, digest)) => (name, Some(digest.to_string())),
            None => (text, None),
        };
        // A tag is a ':' after the last path separator, so a registry port
        // (`host:5000/repo`) is not mistaken for one.
        let tag_at = match (name.rfind(':'), name.rfind('/')) {
            (Some(colon), Some(slash)) if colon > slash => Some(colon),
            (Some(colon), None) => Some(colon),
            _ => None,
        };
        let (name, tag) = match tag_at {
            Some(colon) => (&name[..colon], Some(name[colon + 1..].to_string())),
            None => (name, None),
        };
        if tag.is_some() && digest.is_some() {
            return Err(Error::InvalidState(
                "an image name may carry a tag or a digest, not both".to_string(),
            ));
        }
        // The first path component is a registry when it looks like a host:
        // contains a dot or port, or is "localhost".
        let (registry, repository) = match name.split_once('/') {
            Some((first, rest))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (Some(first.to_string()), rest.to_string())
            }
            _ => (None, name.to_string()),
        };
        if repository.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "image name has no repository: {:?}",
                text
            )));
        }
        Ok(ImageName {
            registry,
            repository,
            tag,
            digest,
        })
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    pub fn set_registry(&mut self, registry: Option<impl Into<String>>) {
        self.registry = registry.map(Into::into);
    }

    pub fn set_repository(&mut self, repository: impl Into<String>) -> Result<()> {
        let repository = repository.into();
        if repository.is_empty() {
            return Err(Error::InvalidArgument(
                "repository may not be empty".to_string(),
            ));
        }
        self.repository = repository;
        Ok(())
    }

    pub fn set_tag(&mut self, tag: Option<impl Into<String>>) -> Result<()> {
        let tag = tag.map(Into::into);
        if tag.is_some() && self.digest.is_some() {
            return Err(Error::InvalidState(
                "cannot set a tag while a digest is set".to_string(),
            ));
        }
        self.tag = tag;
        Ok(())
    }

    pub fn set_digest(&mut self, digest: Option<impl Into<String>>) -> Result<()> {
        let digest = digest.map(Into::into);
        if digest.is_some() && self.tag.is_some() {
            return Err(Error::InvalidState(
                "cannot set a digest while a tag is set".to_string(),
            ));
        }
        self.digest = digest;
        Ok(())
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(registry) = &self.registry {
            write!(f, "{}/", registry)?;
        }
        f.write_str(&self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_repository() {
        let image = ImageName::parse("alpine").unwrap();
        assert_eq!(image.repository(), "alpine");
        assert_eq!(image.registry(), None);
        assert_eq!(image.tag(), None);
        assert_eq!(image.digest(), None);
    }

    #[test]
    fn test_parse_registry_with_port_and_tag() {
        let image = ImageName::parse("registry.example.com:5000/team/app:1.2").unwrap();
        assert_eq!(image.registry(), Some("registry.example.com:5000"));
        assert_eq!(image.repository(), "team/app");
        assert_eq!(image.tag(), Some("1.2"));
        assert_eq!(
            image.to_string(),
            "registry.example.com:5000/team/app:1.2"
        );
    }

    #[test]
    fn test_parse_digest() {
        let image = ImageName::parse("alpine@sha256:abc123").unwrap();
        assert_eq!(image.digest(), Some("sha256:abc123"));
        assert_eq!(image.tag(), None);
    }

    #[test]
    fn test_plain_namespace_is_not_a_registry() {
        let image = ImageName::parse("library/ubuntu").unwrap();
        assert_eq!(image.registry(), None);
        assert_eq!(image.repository(), "library/ubuntu");
    }

    #[test]
    fn test_tag_and_digest_are_mutually_exclusive() {
        let mut image = ImageName::parse("alpine:3.20").unwrap();
        assert!(image.set_digest(Some("sha256:abc")).is_err());
        assert_eq!(image.tag(), Some("3.20"));
        image.set_tag(None::<String>).unwrap();
        image.set_digest(Some("sha256:abc")).unwrap();
        assert!(image.set_tag(Some("3.21")).is_err());
    }
}
