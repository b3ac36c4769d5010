//! Composite fixture that provisions a private image for query tests.
//!
//! The fixture mirrors what a real project would stand up before snapshot
//! queries make sense: look up an availability zone, a small flavor, and the
//! default subnet, boot a compute instance from a builder image, then
//! snapshot that instance into a managed image carrying a tags map. Every
//! created resource is named and tagged with the acceptance-run id so the
//! sweeper can find leftovers.

use uuid::Uuid;

use crate::document::{AttrValue, Block, BlockKind, Document, DocumentError};
use crate::image::{ImageFromInstance, ImageQuery, Visibility};

/// Tag key planted in every fixture-created image, holding the run id.
pub const RUN_TAG_KEY: &str = "acc-run";

/// Prefix of every generated resource name.
pub const NAME_PREFIX: &str = "stackcheck-";

/// Generates a fresh acceptance-run identifier.
#[must_use]
pub fn generate_run_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Builder for the snapshot fixture document.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SnapshotFixture {
    run_id: String,
    builder_image: String,
    subnet_name: String,
    performance_type: String,
    cpu_core_count: i64,
    memory_size: i64,
}

impl SnapshotFixture {
    /// Creates a fixture for the given run id with default shape values.
    #[must_use]
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            builder_image: String::from("Ubuntu 18.04 server 64bit"),
            subnet_name: String::from("subnet-default"),
            performance_type: String::from("normal"),
            cpu_core_count: 2,
            memory_size: 4,
        }
    }

    /// Overrides the image the builder instance boots from.
    #[must_use]
    pub fn builder_image(mut self, value: impl Into<String>) -> Self {
        self.builder_image = value.into();
        self
    }

    /// Overrides the subnet looked up for instance networking.
    #[must_use]
    pub fn subnet_name(mut self, value: impl Into<String>) -> Self {
        self.subnet_name = value.into();
        self
    }

    /// Name shared by the compute instance and the snapshotted image.
    #[must_use]
    pub fn resource_name(&self) -> String {
        format!("{NAME_PREFIX}{}", self.run_id)
    }

    /// Address of the snapshotted image resource in state.
    #[must_use]
    pub fn image_address(&self) -> String {
        format!("{}.test", crate::image::IMAGE_TYPE)
    }

    /// Builds the base document: zone, flavor, and subnet lookups, the
    /// builder instance, and the snapshotted image.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when the run id renders an invalid image
    /// block; this cannot happen for ids produced by [`generate_run_id`].
    pub fn document(&self) -> Result<Document, DocumentError> {
        let zones = Block::new(BlockKind::Data, "cumulus_availability_zones", "test");
        let flavors = Block::new(BlockKind::Data, "cumulus_compute_flavors", "test")
            .attr("availability_zone", AttrValue::Ref(zones.reference("names[0]")))
            .attr_str("performance_type", &self.performance_type)
            .attr("cpu_core_count", AttrValue::Int(self.cpu_core_count))
            .attr("memory_size", AttrValue::Int(self.memory_size));
        let subnet = Block::new(BlockKind::Data, "cumulus_vpc_subnet", "test")
            .attr_str("name", &self.subnet_name);
        let instance = Block::new(BlockKind::Resource, "cumulus_compute_instance", "test")
            .attr_str("name", self.resource_name())
            .attr_str("image_name", &self.builder_image)
            .attr("flavor_id", AttrValue::Ref(flavors.reference("ids[0]")))
            .attr(
                "security_groups",
                AttrValue::List(vec![String::from("default")]),
            )
            .attr("availability_zone", AttrValue::Ref(zones.reference("names[0]")))
            .nested(
                "network",
                vec![(String::from("uuid"), AttrValue::Ref(subnet.reference("id")))],
            );

        let mut document = Document::new();
        document.push(zones);
        document.push(flavors);
        document.push(subnet);
        document.push(instance);
        document.push(self.image_block()?);
        Ok(document)
    }

    /// Base document plus a lookup of the snapshotted image by its name.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when a block fails validation; this cannot
    /// happen for ids produced by [`generate_run_id`].
    pub fn query_by_name(&self) -> Result<Document, DocumentError> {
        let mut document = self.document()?;
        let query = ImageQuery::new()
            .most_recent(true)
            .name_ref(format!("{}.name", self.image_address()))
            .build()?;
        document.push(query);
        Ok(document)
    }

    /// Base document plus a lookup of the snapshotted image by tag filter.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidTagFilter`] for a malformed `tag`.
    pub fn query_by_tag(&self, tag: &str) -> Result<Document, DocumentError> {
        let mut document = self.document()?;
        let query = ImageQuery::new()
            .most_recent(true)
            .visibility(Visibility::Private)
            .tag(tag)
            .build()?;
        document.push(query);
        Ok(document)
    }

    fn image_block(&self) -> Result<Block, DocumentError> {
        ImageFromInstance::new(self.resource_name())
            .instance_ref("cumulus_compute_instance.test.id")
            .description("created by stackcheck acceptance run")
            .tag("foo", "bar")
            .tag("key", "value")
            .tag(RUN_TAG_KEY, &self.run_id)
            .build()
    }
}
