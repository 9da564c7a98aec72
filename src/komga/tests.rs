//! Komga adapter tests with HTTP mocking.

use super::*;
use crate::config::KomgaConfig;
use crate::error::ComicError;
use crate::mcp::ToolHandler;
use serde_json::json;
use wiremock::matchers::{any, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_key_client(base_url: String) -> KomgaClient {
    KomgaClient::new(KomgaConfig {
        base_url,
        api_key: Some("secret-key".to_string()),
        ..KomgaConfig::default()
    })
    .unwrap()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_api_key_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/libraries"))
            .and(header("X-API-Key", "secret-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "lib1", "name": "Comics" }
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = api_key_client(mock_server.uri());
        let libraries = client.get_libraries().await.unwrap();

        assert_eq!(libraries[0]["name"], "Comics");
    }

    #[tokio::test]
    async fn test_basic_auth_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/libraries"))
            .and(header("Authorization", "Basic dXNlcjpwYXNz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = KomgaClient::new(KomgaConfig {
            base_url: mock_server.uri(),
            username: Some("user".to_string()),
            password: Some("pass".to_string()),
            ..KomgaConfig::default()
        })
        .unwrap();

        assert_eq!(client.get_libraries().await.unwrap(), json!([]));
    }

    #[tokio::test]
    async fn test_missing_auth_sends_nothing() {
        let mock_server = MockServer::start().await;

        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = KomgaClient::new(KomgaConfig {
            base_url: mock_server.uri(),
            ..KomgaConfig::default()
        })
        .unwrap();

        let result = client.search_series(&SeriesSearch::default()).await;
        assert!(matches!(result, Err(ComicError::Config(_))));
        mock_server.verify().await;
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/libraries"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&mock_server)
            .await;

        let client = api_key_client(mock_server.uri());
        match client.get_libraries().await {
            Err(ComicError::Http { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "Unauthorized");
            }
            other => panic!("expected HTTP error, got {:?}", other),
        }
    }
}

mod search_tests {
    use super::*;

    #[tokio::test]
    async fn test_series_two_genres_use_all_of() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/series/list"))
            .and(query_param("page", "0"))
            .and(query_param("size", "20"))
            .and(body_json(json!({
                "condition": {
                    "allOf": [
                        { "genre": { "operator": "is", "value": "Horror" } },
                        { "genre": { "operator": "is", "value": "Crime" } }
                    ]
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{ "id": "s1", "name": "Criminal" }],
                "totalElements": 1
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = api_key_client(mock_server.uri());
        let query = SeriesSearch {
            genre: strings(&["Horror", "Crime"]),
            page: Some(0),
            size: Some(20),
            ..SeriesSearch::default()
        };
        let page = client.search_series(&query).await.unwrap();

        assert_eq!(page["totalElements"], 1);
    }

    #[tokio::test]
    async fn test_series_single_genre_is_bare_leaf() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/series/list"))
            .and(body_json(json!({
                "condition": { "genre": { "operator": "is", "value": "Horror" } },
                "fullTextSearch": "hellboy"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": [] })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = api_key_client(mock_server.uri());
        let query = SeriesSearch {
            search: Some("hellboy".to_string()),
            genre: strings(&["Horror"]),
            ..SeriesSearch::default()
        };
        client.search_series(&query).await.unwrap();
    }

    #[tokio::test]
    async fn test_books_search_sort() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/books/list"))
            .and(query_param("sort", "metadata.numberSort,asc"))
            .and(body_json(json!({
                "condition": { "seriesId": { "operator": "is", "value": "s1" } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": [] })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = api_key_client(mock_server.uri());
        let query = BookSearch {
            series_id: strings(&["s1"]),
            sort: Some("metadata.numberSort,asc".to_string()),
            ..BookSearch::default()
        };
        client.search_books(&query).await.unwrap();
    }

    #[tokio::test]
    async fn test_authors_query_string() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/authors"))
            .and(query_param("search", "moore"))
            .and(query_param("role", "writer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{ "name": "Alan Moore", "role": "writer" }]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = api_key_client(mock_server.uri());
        let query = AuthorQuery {
            search: Some("moore".to_string()),
            role: Some("writer".to_string()),
            ..AuthorQuery::default()
        };
        let authors = client.search_authors(&query).await.unwrap();

        assert_eq!(authors["content"][0]["name"], "Alan Moore");
    }
}

mod listing_tests {
    use super::*;

    #[tokio::test]
    async fn test_metadata_options_merge() {
        let mock_server = MockServer::start().await;

        for (endpoint, values) in [
            ("/api/v1/genres", json!(["Horror"])),
            ("/api/v1/tags", json!(["noir"])),
            ("/api/v1/publishers", json!(["Image"])),
            ("/api/v1/languages", json!(["en"])),
            ("/api/v1/age-ratings", json!(["16"])),
        ] {
            Mock::given(method("GET"))
                .and(path(endpoint))
                .and(query_param("library_id", "lib1"))
                .respond_with(ResponseTemplate::new(200).set_body_json(values))
                .expect(1)
                .mount(&mock_server)
                .await;
        }

        let client = api_key_client(mock_server.uri());
        let options = client.get_metadata_options(Some("lib1")).await.unwrap();

        assert_eq!(
            options,
            json!({
                "genres": ["Horror"],
                "tags": ["noir"],
                "publishers": ["Image"],
                "languages": ["en"],
                "age_ratings": ["16"]
            })
        );
    }

    #[tokio::test]
    async fn test_latest_additions_selected_kind() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/books/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": ["b1"] })))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/series/new"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = api_key_client(mock_server.uri());
        let query = LatestQuery {
            content_types: Some(vec![LatestKind::Books]),
            ..LatestQuery::default()
        };
        let latest = client.get_latest_additions(&query).await.unwrap();

        assert_eq!(latest, json!({ "books": { "content": ["b1"] } }));
    }

    #[tokio::test]
    async fn test_latest_additions_default_all() {
        let mock_server = MockServer::start().await;

        for endpoint in ["/api/v1/series/new", "/api/v1/series/updated", "/api/v1/books/latest"] {
            Mock::given(method("GET"))
                .and(path(endpoint))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": [] })))
                .expect(1)
                .mount(&mock_server)
                .await;
        }

        let client = api_key_client(mock_server.uri());
        let latest = client
            .get_latest_additions(&LatestQuery::default())
            .await
            .unwrap();

        let keys: Vec<&String> = latest.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
        assert!(latest.get("updated_series").is_some());
    }

    #[tokio::test]
    async fn test_collections_and_reading_lists() {
        let mock_server = MockServer::start().await;

        for endpoint in ["/api/v1/collections", "/api/v1/readlists"] {
            Mock::given(method("GET"))
                .and(path(endpoint))
                .and(query_param("search", "marvel"))
                .and(query_param("library_id", "lib1"))
                .and(query_param("size", "10"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "content": [{ "id": "x1" }]
                })))
                .expect(1)
                .mount(&mock_server)
                .await;
        }

        let client = api_key_client(mock_server.uri());
        let query = ListQuery {
            search: Some("marvel".to_string()),
            library_id: Some("lib1".to_string()),
            size: Some(10),
            ..ListQuery::default()
        };

        let collections = client.get_collections(&query).await.unwrap();
        let reading_lists = client.get_reading_lists(&query).await.unwrap();

        assert_eq!(collections["content"][0]["id"], "x1");
        assert_eq!(reading_lists["content"][0]["id"], "x1");
    }

    #[tokio::test]
    async fn test_on_deck_paging() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/books/ondeck"))
            .and(query_param("page", "1"))
            .and(query_param("size", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": [] })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = api_key_client(mock_server.uri());
        let query = ListQuery {
            page: Some(1),
            size: Some(5),
            ..ListQuery::default()
        };
        client.get_on_deck_books(&query).await.unwrap();
    }
}

mod reading_list_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_reading_list_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/readlists"))
            .and(body_json(json!({
                "name": "Crisis",
                "summary": "",
                "ordered": true,
                "bookIds": ["b1", "b2"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "rl9" })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = api_key_client(mock_server.uri());
        let list = NewReadingList {
            name: "Crisis".to_string(),
            summary: String::new(),
            ordered: true,
            book_ids: strings(&["b1", "b2"]),
        };
        let created = client.create_reading_list(&list).await.unwrap();

        assert_eq!(created["id"], "rl9");
    }

    #[tokio::test]
    async fn test_add_to_reading_list_unions_ids() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/readlists/rl1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "rl1",
                "name": "Favourites",
                "summary": "",
                "ordered": true,
                "bookIds": ["2", "3"]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/v1/readlists/rl1"))
            .and(body_json(json!({
                "name": "Favourites",
                "summary": "",
                "ordered": true,
                "bookIds": ["2", "3", "1"]
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = api_key_client(mock_server.uri());
        let addition = ReadingListAddition {
            reading_list_id: "rl1".to_string(),
            book_ids: strings(&["1", "2"]),
            ..ReadingListAddition::default()
        };
        let summary = client.add_to_reading_list(&addition).await.unwrap();

        assert_eq!(summary.status, "success");
        assert_eq!(summary.id, "rl1");
        assert_eq!(summary.total_books, 3);
    }

    #[tokio::test]
    async fn test_add_to_missing_reading_list() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/readlists/nope"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&mock_server)
            .await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = api_key_client(mock_server.uri());
        let addition = ReadingListAddition {
            reading_list_id: "nope".to_string(),
            book_ids: strings(&["1"]),
            ..ReadingListAddition::default()
        };
        let result = client.add_to_reading_list(&addition).await;

        assert!(matches!(result, Err(ComicError::Http { status: 404, .. })));
    }
}

mod tool_tests {
    use super::*;

    #[tokio::test]
    async fn test_configure_komga_replaces_client() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/libraries"))
            .and(header("X-API-Key", "new-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "lib1" }])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let tools = KomgaTools::from_config(KomgaConfig::default()).unwrap();
        let before = tools.call("get_libraries", json!({})).await;
        assert!(matches!(before, Err(ComicError::Config(_))));

        let configured = tools
            .call(
                "configure_komga",
                json!({ "base_url": mock_server.uri(), "api_key": "new-key" }),
            )
            .await
            .unwrap();
        assert_eq!(configured["status"], "success");
        assert_eq!(configured["auth"], "api_key");
        assert!(configured.get("api_key").is_none());
        assert_eq!(tools.client().await.config().timeout_secs, 30);

        let libraries = tools.call("get_libraries", json!({})).await.unwrap();
        assert_eq!(libraries[0]["id"], "lib1");
    }

    #[tokio::test]
    async fn test_add_to_reading_list_tool_output() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/readlists/rl1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "rl1",
                "name": "Arc",
                "bookIds": ["a"]
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/v1/readlists/rl1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let tools = KomgaTools::new(api_key_client(mock_server.uri()));
        let output = tools
            .call(
                "add_to_reading_list",
                json!({ "reading_list_id": "rl1", "book_ids": ["b", "a"] }),
            )
            .await
            .unwrap();

        assert_eq!(
            output,
            json!({ "status": "success", "id": "rl1", "total_books": 2 })
        );
    }

    #[tokio::test]
    async fn test_add_numeric_book_ids() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/readlists/rl1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "rl1",
                "name": "Favourites",
                "summary": "",
                "ordered": true,
                "bookIds": ["2", "3"]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/v1/readlists/rl1"))
            .and(body_json(json!({
                "name": "Favourites",
                "summary": "",
                "ordered": true,
                "bookIds": ["2", "3", "1"]
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let tools = KomgaTools::new(api_key_client(mock_server.uri()));
        let output = tools
            .call(
                "add_to_reading_list",
                json!({ "reading_list_id": "rl1", "book_ids": [1, 2] }),
            )
            .await
            .unwrap();

        assert_eq!(output["total_books"], 3);
    }

    #[tokio::test]
    async fn test_unknown_and_invalid_calls() {
        let tools = KomgaTools::new(api_key_client("http://127.0.0.1:9".to_string()));

        let unknown = tools.call("delete_everything", json!({})).await;
        assert!(matches!(unknown, Err(ComicError::Validation(_))));

        let invalid = tools.call("create_reading_list", json!({ "name": 5 })).await;
        assert!(matches!(invalid, Err(ComicError::Validation(_))));
    }

    #[test]
    fn test_tool_definitions() {
        let names: Vec<String> = komga_tool_definitions()
            .into_iter()
            .map(|tool| tool.name)
            .collect();
        assert_eq!(names.len(), 12);
        assert!(names.contains(&"configure_komga".to_string()));
        assert!(names.contains(&"get_latest_additions".to_string()));
    }
}
