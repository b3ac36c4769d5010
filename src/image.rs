//! Builders for the image blocks understood by the `cumulus` provider.
//!
//! Two block shapes exist: a read-only image lookup with a set of selection
//! fields, and a managed image snapshotted from a running compute instance.

use crate::document::{AttrValue, Block, BlockKind, DocumentError};

/// Resource type of the image data source and the managed image resource.
pub const IMAGE_TYPE: &str = "cumulus_images_image";

/// Default block label used by acceptance fixtures.
pub const DEFAULT_LABEL: &str = "test";

/// Image visibility filter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Visibility {
    /// Provider-published images visible to every project.
    Public,
    /// Images owned by the current project.
    Private,
}

impl Visibility {
    /// Wire value used in configuration documents and state attributes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

/// Builder for an image lookup block.
///
/// At least one selector (`name`, `name_regex`, `os_version`, `visibility`,
/// or `tag`) must be set; `build` rejects selector-free queries because the
/// engine would otherwise match every image it can see. A visibility-only
/// query is accepted because `most_recent` resolves the multi-match.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ImageQuery {
    label: String,
    name: Option<AttrValue>,
    name_regex: Option<String>,
    os_version: Option<String>,
    architecture: Option<String>,
    visibility: Option<Visibility>,
    most_recent: bool,
    tag: Option<String>,
}

impl ImageQuery {
    /// Starts a query with the default `test` label.
    #[must_use]
    pub fn new() -> Self {
        Self {
            label: String::from(DEFAULT_LABEL),
            ..Self::default()
        }
    }

    /// Overrides the block label.
    #[must_use]
    pub fn label(mut self, value: impl Into<String>) -> Self {
        self.label = value.into();
        self
    }

    /// Selects by exact image name. Accepts a literal string; use
    /// [`ImageQuery::name_ref`] to reference another block.
    #[must_use]
    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.name = Some(AttrValue::Str(value.into()));
        self
    }

    /// Selects by name using a reference expression such as
    /// `cumulus_images_image.test.name`.
    #[must_use]
    pub fn name_ref(mut self, expr: impl Into<String>) -> Self {
        self.name = Some(AttrValue::Ref(expr.into()));
        self
    }

    /// Selects by regular expression over image names.
    #[must_use]
    pub fn name_regex(mut self, value: impl Into<String>) -> Self {
        self.name_regex = Some(value.into());
        self
    }

    /// Selects by operating system version label.
    #[must_use]
    pub fn os_version(mut self, value: impl Into<String>) -> Self {
        self.os_version = Some(value.into());
        self
    }

    /// Restricts matches to one CPU architecture (for example `x86`).
    #[must_use]
    pub fn architecture(mut self, value: impl Into<String>) -> Self {
        self.architecture = Some(value.into());
        self
    }

    /// Restricts matches to one visibility class.
    #[must_use]
    pub const fn visibility(mut self, value: Visibility) -> Self {
        self.visibility = Some(value);
        self
    }

    /// Breaks ties between multiple matches by creation date.
    #[must_use]
    pub const fn most_recent(mut self, value: bool) -> Self {
        self.most_recent = value;
        self
    }

    /// Filters by a `key=value` tag pair.
    #[must_use]
    pub fn tag(mut self, value: impl Into<String>) -> Self {
        self.tag = Some(value.into());
        self
    }

    /// Builds the data source block.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::MissingSelector`] when no selection field is
    /// set, [`DocumentError::EmptyField`] when a set field is blank, and
    /// [`DocumentError::InvalidTagFilter`] for a malformed tag filter.
    pub fn build(self) -> Result<Block, DocumentError> {
        if self.name.is_none()
            && self.name_regex.is_none()
            && self.os_version.is_none()
            && self.visibility.is_none()
            && self.tag.is_none()
        {
            return Err(DocumentError::MissingSelector);
        }
        require_non_blank("label", &self.label)?;
        if let Some(tag) = &self.tag {
            validate_tag_filter(tag)?;
        }

        let mut block = Block::new(BlockKind::Data, IMAGE_TYPE, &self.label);
        if let Some(value) = self.name {
            if let AttrValue::Str(literal) | AttrValue::Ref(literal) = &value {
                require_non_blank("name", literal)?;
            }
            block = block.attr("name", value);
        }
        if let Some(value) = self.name_regex {
            require_non_blank("name_regex", &value)?;
            block = block.attr_str("name_regex", value);
        }
        if let Some(value) = self.os_version {
            require_non_blank("os_version", &value)?;
            block = block.attr_str("os_version", value);
        }
        if let Some(value) = self.architecture {
            require_non_blank("architecture", &value)?;
            block = block.attr_str("architecture", value);
        }
        if let Some(value) = self.visibility {
            block = block.attr_str("visibility", value.as_str());
        }
        if self.most_recent {
            block = block.attr("most_recent", AttrValue::Bool(true));
        }
        if let Some(value) = self.tag {
            block = block.attr_str("tag", value);
        }
        Ok(block)
    }
}

/// Builder for an image snapshotted from a compute instance.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ImageFromInstance {
    label: String,
    name: String,
    instance_id: Option<AttrValue>,
    description: Option<String>,
    tags: Vec<(String, String)>,
}

impl ImageFromInstance {
    /// Starts a builder with the default `test` label and the given image
    /// name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            label: String::from(DEFAULT_LABEL),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Overrides the block label.
    #[must_use]
    pub fn label(mut self, value: impl Into<String>) -> Self {
        self.label = value.into();
        self
    }

    /// Sets the source instance id as a literal string.
    #[must_use]
    pub fn instance_id(mut self, value: impl Into<String>) -> Self {
        self.instance_id = Some(AttrValue::Str(value.into()));
        self
    }

    /// Sets the source instance id as a reference to another block, for
    /// example `cumulus_compute_instance.test.id`.
    #[must_use]
    pub fn instance_ref(mut self, expr: impl Into<String>) -> Self {
        self.instance_id = Some(AttrValue::Ref(expr.into()));
        self
    }

    /// Sets the free-form description.
    #[must_use]
    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = Some(value.into());
        self
    }

    /// Appends one tag pair to the image's tags map.
    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    /// Builds the managed image block.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::EmptyField`] when `name` or `instance_id`
    /// is missing or blank.
    pub fn build(self) -> Result<Block, DocumentError> {
        require_non_blank("label", &self.label)?;
        require_non_blank("name", &self.name)?;
        let instance_id = match self.instance_id {
            Some(AttrValue::Str(value)) if value.trim().is_empty() => {
                return Err(DocumentError::EmptyField(String::from("instance_id")));
            }
            Some(value) => value,
            None => return Err(DocumentError::EmptyField(String::from("instance_id"))),
        };

        let mut block = Block::new(BlockKind::Resource, IMAGE_TYPE, &self.label)
            .attr_str("name", self.name)
            .attr("instance_id", instance_id);
        if let Some(value) = self.description {
            block = block.attr_str("description", value);
        }
        if !self.tags.is_empty() {
            block = block.attr("tags", AttrValue::Map(self.tags));
        }
        Ok(block)
    }
}

fn require_non_blank(field: &str, value: &str) -> Result<(), DocumentError> {
    if value.trim().is_empty() {
        return Err(DocumentError::EmptyField(field.to_owned()));
    }
    Ok(())
}

fn validate_tag_filter(tag: &str) -> Result<(), DocumentError> {
    match tag.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => Ok(()),
        _ => Err(DocumentError::InvalidTagFilter(tag.to_owned())),
    }
}
