use crate::{Client, Error, Paginate, Result};
use serde::Serialize;
use serde_json::Value;
use stac::Link;

/// A MLHub collection.
///
/// Wraps a [stac::Collection] and exposes the fields this crate needs, plus
/// access to the collection's items.
///
/// # Examples
///
/// ```no_run
/// use mlhub::Client;
///
/// let client = Client::new();
/// let collection = client.collection("ref_african_crops_uganda_01").unwrap();
/// assert_eq!(collection.description(), "African Crops Uganda");
/// for item in collection.items(&client, Some(1)).unwrap() {
///     println!("{}", item.unwrap().id());
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Collection {
    inner: stac::Collection,
}

/// A MLHub item, wrapping a [stac::Item].
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Item {
    inner: stac::Item,
}

/// A lazy iterator over a collection's items.
///
/// Created by [Collection::items].
#[derive(Debug)]
pub struct Items<'a> {
    pages: Paginate<'a>,
    remaining: Option<usize>,
}

impl Collection {
    /// The API path that lists collections.
    pub const PATH: &'static str = "collections";

    /// Creates a collection from a JSON value.
    pub fn from_value(value: Value) -> Result<Collection> {
        let inner: stac::Collection = serde_json::from_value(value)?;
        Ok(Collection { inner })
    }

    /// Returns this collection's id.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Returns this collection's title, if it has one.
    pub fn title(&self) -> Option<&str> {
        self.inner.title.as_deref()
    }

    /// Returns this collection's description.
    pub fn description(&self) -> &str {
        &self.inner.description
    }

    /// Returns this collection's links.
    pub fn links(&self) -> &[Link] {
        &self.inner.links
    }

    /// Returns the first link with this `rel`.
    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.inner.links.iter().find(|link| link.rel == rel)
    }

    /// Lazily iterates over this collection's items, stopping after `limit`
    /// items if one is given.
    ///
    /// Items are paginated from the collection's first `rel="items"` link.
    /// Returns [Error::NotFound] if there isn't one.
    pub fn items<'a>(&self, client: &'a Client, limit: Option<usize>) -> Result<Items<'a>> {
        let link = self
            .link("items")
            .ok_or_else(|| Error::NotFound("no items link".to_string()))?;
        tracing::debug!("paginating items for collection={}", self.id());
        Ok(Items {
            pages: client.paginate(link.href.as_str()),
            remaining: limit,
        })
    }

    /// Returns the wrapped STAC collection.
    pub fn as_stac(&self) -> &stac::Collection {
        &self.inner
    }

    /// Converts into the wrapped STAC collection.
    pub fn into_stac(self) -> stac::Collection {
        self.inner
    }
}

impl From<stac::Collection> for Collection {
    fn from(inner: stac::Collection) -> Collection {
        Collection { inner }
    }
}

impl Item {
    /// Creates an item from a JSON value.
    pub fn from_value(value: Value) -> Result<Item> {
        let inner: stac::Item = serde_json::from_value(value)?;
        Ok(Item { inner })
    }

    /// Returns this item's id.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Returns the id of this item's collection, if it has one.
    pub fn collection(&self) -> Option<&str> {
        self.inner.collection.as_deref()
    }

    /// Returns a non-core property, e.g. `label:description`.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.inner.properties.additional_fields.get(name)
    }

    /// Returns the wrapped STAC item.
    pub fn as_stac(&self) -> &stac::Item {
        &self.inner
    }

    /// Converts into the wrapped STAC item.
    pub fn into_stac(self) -> stac::Item {
        self.inner
    }
}

impl From<stac::Item> for Item {
    fn from(inner: stac::Item) -> Item {
        Item { inner }
    }
}

impl Iterator for Items<'_> {
    type Item = Result<Item>;

    fn next(&mut self) -> Option<Result<Item>> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }
        self.pages
            .next()
            .map(|value| value.and_then(Item::from_value))
    }
}

#[cfg(test)]
mod tests {
    use super::Collection;
    use crate::{Client, Error};
    use serde_json::json;

    fn collection(links: serde_json::Value) -> Collection {
        Collection::from_value(json!({
            "type": "Collection",
            "stac_version": "1.0.0",
            "id": "an-id",
            "description": "A description",
            "license": "CC-BY-4.0",
            "extent": {
                "spatial": {"bbox": [[-180.0, -90.0, 180.0, 90.0]]},
                "temporal": {"interval": [["2018-01-01T00:00:00Z", null]]}
            },
            "links": links
        }))
        .unwrap()
    }

    #[test]
    fn accessors() {
        let collection = collection(json!([
            {"rel": "self", "href": "http://mlhub.test/collections/an-id"},
            {"rel": "items", "href": "http://mlhub.test/collections/an-id/items"}
        ]));
        assert_eq!(collection.id(), "an-id");
        assert_eq!(collection.description(), "A description");
        assert!(collection.title().is_none());
        assert_eq!(collection.links().len(), 2);
        assert_eq!(
            collection.link("items").unwrap().href.as_str(),
            "http://mlhub.test/collections/an-id/items"
        );
        assert!(collection.link("next").is_none());
    }

    #[test]
    fn no_items_link() {
        let collection = collection(json!([]));
        let client = Client::new();
        assert!(matches!(
            collection.items(&client, None).unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[test]
    fn limit_of_zero_fetches_nothing() {
        let collection = collection(json!([
            {"rel": "items", "href": "http://mlhub.invalid/items"}
        ]));
        let client = Client::new().with_api_token("a-token");
        assert_eq!(collection.items(&client, Some(0)).unwrap().count(), 0);
    }

    #[test]
    fn serializes_as_stac() {
        let collection = collection(json!([]));
        let value = serde_json::to_value(&collection).unwrap();
        assert_eq!(value["id"], "an-id");
        assert_eq!(value["type"], "Collection");
    }
}
