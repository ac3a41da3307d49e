use crate::{Client, Error, RequestOptions, Result};
use serde_json::Value;
use stac::Link;

/// A lazy iterator over the items of a paginated listing.
///
/// Nothing is fetched until the iterator is advanced, and the next page is
/// only requested once every item on the current page has been yielded.
/// Pages are chained by the first link with `rel="next"`. After an error the
/// iterator is exhausted.
///
/// Created by [Client::paginate] and [Client::paginate_with].
///
/// # Examples
///
/// ```no_run
/// use mlhub::Client;
///
/// let client = Client::new();
/// let link = "collections/ref_african_crops_uganda_01/items";
/// for item in client.paginate(link).take(10) {
///     println!("{}", item.unwrap()["id"]);
/// }
/// ```
#[derive(Debug)]
pub struct Paginate<'a> {
    client: &'a Client,
    items_field: String,
    next: Option<String>,
    page: std::vec::IntoIter<Value>,
}

#[derive(Debug)]
struct Page {
    items: Vec<Value>,
    next: Option<String>,
}

impl<'a> Paginate<'a> {
    pub(crate) fn new(client: &'a Client, link: String, items_field: String) -> Paginate<'a> {
        Paginate {
            client,
            items_field,
            next: Some(link),
            page: Vec::new().into_iter(),
        }
    }

    fn fetch(&self, link: &str) -> Result<Page> {
        tracing::debug!("fetching page {link}");
        let value = self.client.get(link, None, RequestOptions::default())?;
        Page::from_value(value, &self.items_field)
    }
}

impl Iterator for Paginate<'_> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Result<Value>> {
        loop {
            if let Some(item) = self.page.next() {
                return Some(Ok(item));
            }
            let link = self.next.take()?;
            match self.fetch(&link) {
                Ok(page) => {
                    self.next = page.next;
                    self.page = page.items.into_iter();
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

impl std::iter::FusedIterator for Paginate<'_> {}

impl Page {
    fn from_value(value: Value, items_field: &str) -> Result<Page> {
        match value {
            Value::Array(items) => Ok(Page { items, next: None }),
            Value::Object(mut object) => {
                let items = match object.remove(items_field) {
                    Some(Value::Array(items)) => items,
                    Some(_) => {
                        return Err(Error::Parse(format!(
                            "{items_field} field is not an array"
                        )));
                    }
                    None => Vec::new(),
                };
                let links = object
                    .remove("links")
                    .ok_or_else(|| Error::Parse("no links field in page".to_string()))?;
                let links: Vec<Link> = serde_json::from_value(links)
                    .map_err(|err| Error::Parse(format!("invalid links: {err}")))?;
                let next = links
                    .into_iter()
                    .find(|link| link.rel == "next")
                    .map(|link| link.href.as_str().to_string())
                    .filter(|href| !href.is_empty());
                Ok(Page { items, next })
            }
            other => Err(Error::Parse(format!(
                "unexpected response shape: {}",
                kind(&other)
            ))),
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::Page;
    use crate::{Client, Error};
    use mockito::{Server, ServerGuard};
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    #[fixture]
    fn server() -> ServerGuard {
        Server::new()
    }

    fn client(server: &ServerGuard) -> Client {
        Client::new()
            .with_base_url(server.url())
            .unwrap()
            .with_api_token("a-token")
    }

    fn next_link(href: &str) -> Value {
        json!({"rel": "next", "href": href})
    }

    #[rstest]
    fn follows_next_links(mut server: ServerGuard) {
        let url = server.url();
        let first = server
            .mock("GET", "/pages/1")
            .with_body(
                json!({
                    "features": [{"id": "a"}, {"id": "b"}],
                    "links": [{"rel": "self", "href": format!("{url}/pages/1")}, next_link(&format!("{url}/pages/2"))]
                })
                .to_string(),
            )
            .create();
        let second = server
            .mock("GET", "/pages/2")
            .with_body(
                json!({
                    "features": [{"id": "c"}],
                    "links": [next_link("pages/3")]
                })
                .to_string(),
            )
            .create();
        let third = server
            .mock("GET", "/pages/3")
            .with_body(json!({"features": [{"id": "d"}], "links": []}).to_string())
            .create();
        let client = client(&server);
        let ids: Vec<_> = client
            .paginate("pages/1")
            .map(|item| item.unwrap()["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, ["a", "b", "c", "d"]);
        first.assert();
        second.assert();
        third.assert();
    }

    #[rstest]
    fn bare_list(mut server: ServerGuard) {
        let _mock = server
            .mock("GET", "/list")
            .with_body(r#"[{"id": "a"}, {"id": "b"}]"#)
            .create();
        let client = client(&server);
        let items: Vec<_> = client.paginate("list").collect::<Result<_, _>>().unwrap();
        assert_eq!(items, [json!({"id": "a"}), json!({"id": "b"})]);
    }

    #[rstest]
    fn custom_items_field(mut server: ServerGuard) {
        let _mock = server
            .mock("GET", "/collections")
            .with_body(json!({"collections": [{"id": "a"}], "links": []}).to_string())
            .create();
        let client = client(&server);
        let items: Vec<_> = client
            .paginate_with("collections", "collections")
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(items, [json!({"id": "a"})]);
    }

    #[rstest]
    fn missing_links_is_an_error(mut server: ServerGuard) {
        let _mock = server
            .mock("GET", "/pages/1")
            .with_body(json!({"features": [{"id": "a"}]}).to_string())
            .create();
        let client = client(&server);
        let mut paginate = client.paginate("pages/1");
        assert!(matches!(paginate.next().unwrap().unwrap_err(), Error::Parse(_)));
        assert!(paginate.next().is_none());
    }

    #[rstest]
    fn nothing_fetched_until_pulled(mut server: ServerGuard) {
        let url = server.url();
        let first = server
            .mock("GET", "/pages/1")
            .with_body(
                json!({
                    "features": [{"id": "a"}, {"id": "b"}],
                    "links": [next_link(&format!("{url}/pages/2"))]
                })
                .to_string(),
            )
            .expect(1)
            .create();
        let second = server.mock("GET", "/pages/2").expect(0).create();
        let client = client(&server);
        let mut paginate = client.paginate("pages/1");
        assert!(!first.matched());
        let item = paginate.next().unwrap().unwrap();
        assert_eq!(item["id"], "a");
        first.assert();
        second.assert();
    }

    #[rstest]
    fn http_errors_end_pagination(mut server: ServerGuard) {
        let _mock = server.mock("GET", "/pages/1").with_status(500).create();
        let client = client(&server);
        let mut paginate = client.paginate("pages/1");
        assert!(matches!(
            paginate.next().unwrap().unwrap_err(),
            Error::Http { status: 500, .. }
        ));
        assert!(paginate.next().is_none());
    }

    #[test]
    fn missing_items_field_is_empty() {
        let page = Page::from_value(json!({"links": []}), "features").unwrap();
        assert!(page.items.is_empty());
        assert!(page.next.is_none());
    }

    #[test]
    fn empty_next_href_stops() {
        let page = Page::from_value(
            json!({"features": [], "links": [{"rel": "next", "href": ""}]}),
            "features",
        )
        .unwrap();
        assert!(page.next.is_none());
    }

    #[test]
    fn first_next_link_wins() {
        let page = Page::from_value(
            json!({"features": [], "links": [next_link("http://mlhub.test/a"), next_link("http://mlhub.test/b")]}),
            "features",
        )
        .unwrap();
        assert_eq!(page.next.unwrap(), "http://mlhub.test/a");
    }

    #[rstest]
    #[case(json!("a string"))]
    #[case(json!(42))]
    #[case(Value::Null)]
    #[case(json!({"features": {"id": "a"}, "links": []}))]
    #[case(json!({"features": [], "links": "not a list"}))]
    fn unexpected_shapes(#[case] value: Value) {
        assert!(matches!(
            Page::from_value(value, "features").unwrap_err(),
            Error::Parse(_)
        ));
    }
}
