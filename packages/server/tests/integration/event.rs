use chrono::{Duration, Utc};
use reqwest::multipart::Form;
use serde_json::json;

use crate::common::{TestApp, event_form, picture_part, routes};

mod create {
    use super::*;

    #[tokio::test]
    async fn create_form_lists_choices_and_upload_limit() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let res = app.get_with_token(routes::EVENT_CREATE, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["venues"].as_array().unwrap().len(), 10);
        assert_eq!(res.body["venues"][0], "Babeville");
        assert_eq!(res.body["show_times"][0], "12:00PM");
        assert_eq!(res.body["show_times"][8], "8:00PM");
        assert_eq!(res.body["max_upload_size"], 2 * 1024 * 1024);
        assert_eq!(res.body["max_upload_size_text"], "2.0MB");
        assert!(res.body["initial"].is_null());
    }

    #[tokio::test]
    async fn valid_event_is_created_and_redirects_to_listing() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let show_date = (Utc::now() + Duration::days(30)).date_naive().to_string();

        let form = event_form("Test Band")
            .text("pledge", "1500.50")
            .text("show_date", show_date.clone())
            .text("show_time", "7:00PM");
        let id = app.submit_event(&token, form).await;

        let res = app.get_without_token(&routes::event(id)).await;
        assert_eq!(res.status, 200);
        let event = &res.body["event"];
        assert_eq!(event["performer"], "Test Band");
        assert_eq!(event["venue"], "Babeville");
        assert_eq!(event["show_date"], show_date);
        assert_eq!(event["show_time"], "7:00PM");
        assert_eq!(event["text"], "An evening of live music.");
        assert!(event["picture_url"].is_null());
        let pledge: f64 = event["pledge"].as_str().unwrap().parse().unwrap();
        assert_eq!(pledge, 1500.5);
    }

    #[tokio::test]
    async fn performer_shorter_than_two_characters_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        for performer in ["", "X", "  Y  "] {
            let res = app
                .post_multipart_with_token(routes::EVENT_CREATE, event_form(performer), &token)
                .await;
            assert_eq!(res.status, 400, "performer {performer:?}");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
            assert_eq!(res.error_fields(), ["performer"]);
        }

        let listing = app.get_without_token(routes::HOME).await;
        assert!(listing.body["events"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn every_invalid_field_is_reported() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let yesterday = (Utc::now() - Duration::days(2)).date_naive().to_string();

        let form = Form::new()
            .text("performer", "Test Band")
            .text("venue", "Madison Square Garden")
            .text("pledge", "lots")
            .text("show_date", yesterday)
            .text("show_time", "11:00PM");
        let res = app
            .post_multipart_with_token(routes::EVENT_CREATE, form, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(
            res.error_fields(),
            ["pledge", "venue", "text", "show_date", "show_time"]
        );
    }

    #[tokio::test]
    async fn tags_are_deduplicated_and_shown_everywhere() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let form = event_form("Test Band").text("tags", "rock, indie pop,rock, ");
        let id = app.submit_event(&token, form).await;

        let detail = app.get_without_token(&routes::event(id)).await;
        assert_eq!(detail.body["event"]["tags"], json!(["indie pop", "rock"]));

        let listing = app.get_without_token(routes::HOME).await;
        assert_eq!(listing.body["events"][0]["tags"], json!(["indie pop", "rock"]));

        let edit = app.get_with_token(&routes::event_update(id), &token).await;
        assert_eq!(edit.body["initial"]["tags"], "indie pop, rock");
    }

    #[tokio::test]
    async fn event_without_tags_has_an_empty_list() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_event(&token, "Test Band").await;

        let detail = app.get_without_token(&routes::event(id)).await;
        assert_eq!(detail.body["event"]["tags"], json!([]));
    }

    #[tokio::test]
    async fn malformed_multipart_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let res = app
            .post_with_token(routes::EVENT_CREATE, &json!({"performer": "Test Band"}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn lists_all_events_with_relative_update_time() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let first = app.create_event(&token, "First Band").await;
        let second = app.create_event(&token, "Second Band").await;

        let res = app.get_without_token(routes::HOME).await;

        assert_eq!(res.status, 200);
        let events = res.body["events"].as_array().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["id"], first);
        assert_eq!(events[1]["id"], second);
        let natural = events[0]["natural_updated"].as_str().unwrap();
        assert!(
            natural == "now" || natural.ends_with("seconds ago") || natural == "a second ago",
            "unexpected natural time {natural:?}"
        );
        assert!(res.body["search"].is_null());
        assert_eq!(res.body["favorites"], json!([]));
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_ordered_by_show_time() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let late = app
            .submit_event(&token, event_form("Late Band").text("show_time", "7:00PM"))
            .await;
        app.submit_event(&token, event_form("Solo Act").text("show_time", "3:00PM"))
            .await;
        let early = app
            .submit_event(&token, event_form("the early band").text("show_time", "5:00PM"))
            .await;

        let res = app.get_without_token(&routes::search("Band")).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["search"], "Band");
        let ids: Vec<i64> = res.body["events"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, [early as i64, late as i64]);
    }

    #[tokio::test]
    async fn untimed_events_come_after_timed_ones_in_search() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let untimed = app.create_event(&token, "Untimed Band").await;
        let timed = app
            .submit_event(&token, event_form("Timed Band").text("show_time", "7:00PM"))
            .await;

        let res = app.get_without_token(&routes::search("band")).await;

        let ids: Vec<i64> = res.body["events"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, [timed as i64, untimed as i64]);
    }

    #[tokio::test]
    async fn search_returns_at_most_ten_results() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        for n in 0..12 {
            app.create_event(&token, &format!("Band {n}")).await;
        }

        let res = app.get_without_token(&routes::search("band")).await;
        assert_eq!(res.body["events"].as_array().unwrap().len(), 10);

        let all = app.get_without_token(routes::HOME).await;
        assert_eq!(all.body["events"].as_array().unwrap().len(), 12);
    }

    #[tokio::test]
    async fn like_wildcards_in_search_match_literally() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        app.create_event(&token, "Plain Band").await;
        let percent = app.create_event(&token, "100% Band").await;

        let res = app.get_without_token(&routes::search("%25")).await;

        let events = res.body["events"].as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["id"], percent);
    }

    #[tokio::test]
    async fn blank_search_lists_everything() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        app.create_event(&token, "Test Band").await;

        let res = app.get_without_token(&routes::search("%20%20")).await;

        assert_eq!(res.body["events"].as_array().unwrap().len(), 1);
        assert!(res.body["search"].is_null());
    }
}

mod detail {
    use super::*;

    #[tokio::test]
    async fn missing_event_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::event(999)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn detail_offers_the_donation_amounts() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_event(&token, "Test Band").await;

        let res = app.get_without_token(&routes::event(id)).await;

        let choices = res.body["donation_form"]["choices"].as_array().unwrap();
        assert_eq!(choices.len(), 19);
        assert_eq!(res.body["donations"], json!([]));
        assert_eq!(res.body["comments"], json!([]));
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn owner_sees_prefilled_form() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_event(&token, "Test Band").await;

        let res = app.get_with_token(&routes::event_update(id), &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["initial"]["performer"], "Test Band");
        assert_eq!(res.body["initial"]["venue"], "Babeville");
        assert_eq!(res.body["initial"]["has_picture"], false);
    }

    #[tokio::test]
    async fn owner_can_update_event() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_event(&token, "Test Band").await;

        let form = Form::new()
            .text("performer", "Renamed Band")
            .text("venue", "The Cave")
            .text("text", "New description");
        let res = app
            .post_multipart_with_token(&routes::event_update(id), form, &token)
            .await;

        assert_eq!(res.status, 303, "update failed: {}", res.text);
        assert_eq!(res.location(), Some("/"));

        let detail = app.get_without_token(&routes::event(id)).await;
        assert_eq!(detail.body["event"]["performer"], "Renamed Band");
        assert_eq!(detail.body["event"]["venue"], "The Cave");
        assert_eq!(detail.body["event"]["text"], "New description");
    }

    #[tokio::test]
    async fn update_replaces_the_tag_set() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app
            .submit_event(&token, event_form("Test Band").text("tags", "rock, jazz"))
            .await;
        let other = app
            .submit_event(&token, event_form("Other Band").text("tags", "rock"))
            .await;

        let res = app
            .post_multipart_with_token(
                &routes::event_update(id),
                event_form("Test Band").text("tags", "jazz, blues"),
                &token,
            )
            .await;
        assert_eq!(res.status, 303, "update failed: {}", res.text);
        let detail = app.get_without_token(&routes::event(id)).await;
        assert_eq!(detail.body["event"]["tags"], json!(["blues", "jazz"]));

        let res = app
            .post_multipart_with_token(&routes::event_update(id), event_form("Test Band"), &token)
            .await;
        assert_eq!(res.status, 303, "update failed: {}", res.text);
        let detail = app.get_without_token(&routes::event(id)).await;
        assert_eq!(detail.body["event"]["tags"], json!([]));

        let other_detail = app.get_without_token(&routes::event(other)).await;
        assert_eq!(other_detail.body["event"]["tags"], json!(["rock"]));
    }

    #[tokio::test]
    async fn non_owner_is_refused_before_the_body_is_read() {
        let app = TestApp::spawn().await;
        let owner = app.create_authenticated_user("alice", "securepass").await;
        let other = app.create_authenticated_user("bob", "securepass").await;
        let id = app.create_event(&owner, "Test Band").await;
        let content_type = "multipart/form-data; boundary=XBOUNDARYX";

        let res = app
            .post_raw_with_token(&routes::event_update(id), content_type, "not multipart", &other)
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");

        let res = app
            .post_raw_with_token(&routes::event_update(id), content_type, "not multipart", &owner)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn invalid_update_leaves_event_unchanged() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_event(&token, "Test Band").await;

        let res = app
            .post_multipart_with_token(&routes::event_update(id), event_form("X"), &token)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.error_fields(), ["performer"]);

        let detail = app.get_without_token(&routes::event(id)).await;
        assert_eq!(detail.body["event"]["performer"], "Test Band");
    }

    #[tokio::test]
    async fn non_owner_cannot_update_or_view_edit_form() {
        let app = TestApp::spawn().await;
        let owner = app.create_authenticated_user("alice", "securepass").await;
        let other = app.create_authenticated_user("bob", "securepass").await;
        let id = app.create_event(&owner, "Test Band").await;

        let form_res = app.get_with_token(&routes::event_update(id), &other).await;
        assert_eq!(form_res.status, 404);
        assert_eq!(form_res.body["code"], "NOT_FOUND");

        let res = app
            .post_multipart_with_token(&routes::event_update(id), event_form("Hijacked"), &other)
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");

        let detail = app.get_without_token(&routes::event(id)).await;
        assert_eq!(detail.body["event"]["performer"], "Test Band");
    }
}

mod delete {
    use events_server::entity::{comment, donation, event_tag, favorite, tag};
    use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

    use super::*;

    #[tokio::test]
    async fn non_owner_cannot_delete() {
        let app = TestApp::spawn().await;
        let owner = app.create_authenticated_user("alice", "securepass").await;
        let other = app.create_authenticated_user("bob", "securepass").await;
        let id = app.create_event(&owner, "Test Band").await;

        let res = app
            .post_with_token(&routes::event_delete(id), &json!({}), &other)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
        assert!(app.event_exists(id).await);
    }

    #[tokio::test]
    async fn owner_delete_removes_comments_donations_and_favorites() {
        let app = TestApp::spawn().await;
        let owner = app.create_authenticated_user("alice", "securepass").await;
        let fan = app.create_authenticated_user("bob", "securepass").await;
        let id = app.create_event(&owner, "Test Band").await;
        let other_id = app.create_event(&owner, "Other Band").await;

        for event_id in [id, other_id] {
            let c = app
                .post_with_token(
                    &routes::comment_create(event_id),
                    &json!({"comment": "Great show"}),
                    &fan,
                )
                .await;
            assert_eq!(c.status, 303, "{}", c.text);
            let d = app
                .post_with_token(
                    &routes::donation_create(event_id),
                    &json!({"donation": 50}),
                    &fan,
                )
                .await;
            assert_eq!(d.status, 303, "{}", d.text);
            let f = app
                .post_with_token(&routes::favorite(event_id), &json!({}), &fan)
                .await;
            assert_eq!(f.status, 200, "{}", f.text);
        }

        let res = app
            .post_with_token(&routes::event_delete(id), &json!({}), &owner)
            .await;
        assert_eq!(res.status, 303, "delete failed: {}", res.text);
        assert_eq!(res.location(), Some("/"));

        assert!(!app.event_exists(id).await);
        assert_eq!(app.get_without_token(&routes::event(id)).await.status, 404);

        let comments = comment::Entity::find()
            .filter(comment::Column::EventId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        let donations = donation::Entity::find()
            .filter(donation::Column::EventId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        let favorites = favorite::Entity::find()
            .filter(favorite::Column::EventId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!((comments, donations, favorites), (0, 0, 0));

        // The other event keeps its children.
        let detail = app.get_without_token(&routes::event(other_id)).await;
        assert_eq!(detail.body["comments"].as_array().unwrap().len(), 1);
        assert_eq!(detail.body["donations"].as_array().unwrap().len(), 1);
        let listing = app.get_with_token(routes::HOME, &fan).await;
        assert_eq!(listing.body["favorites"], json!([other_id]));
    }

    #[tokio::test]
    async fn delete_removes_tag_links_but_keeps_shared_tags() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app
            .submit_event(&token, event_form("Test Band").text("tags", "rock, jazz"))
            .await;
        let other = app
            .submit_event(&token, event_form("Other Band").text("tags", "rock"))
            .await;

        let res = app
            .post_with_token(&routes::event_delete(id), &json!({}), &token)
            .await;
        assert_eq!(res.status, 303, "delete failed: {}", res.text);

        let links = event_tag::Entity::find()
            .filter(event_tag::Column::EventId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(links, 0);
        let tags = tag::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(tags, 2);

        let detail = app.get_without_token(&routes::event(other)).await;
        assert_eq!(detail.body["event"]["tags"], json!(["rock"]));
    }
}

mod pictures {
    use super::*;

    #[tokio::test]
    async fn oversize_picture_is_rejected_on_create() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let form = event_form("Test Band").part(
            "picture",
            picture_part(vec![0u8; 2 * 1024 * 1024 + 1], "big.png", "image/png"),
        );
        let res = app
            .post_multipart_with_token(routes::EVENT_CREATE, form, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error_fields(), ["picture"]);
        assert_eq!(res.body["fields"][0]["message"], "File must be < 2.0MB");
    }

    #[tokio::test]
    async fn oversize_picture_is_rejected_on_update() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_event(&token, "Test Band").await;

        let form = event_form("Test Band").part(
            "picture",
            picture_part(vec![0u8; 3 * 1024 * 1024], "big.jpg", "image/jpeg"),
        );
        let res = app
            .post_multipart_with_token(&routes::event_update(id), form, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error_fields(), ["picture"]);
    }

    #[tokio::test]
    async fn empty_file_input_counts_as_no_upload() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let form = event_form("Test Band").part(
            "picture",
            picture_part(Vec::new(), "", "application/octet-stream"),
        );
        let id = app.submit_event(&token, form).await;

        let res = app.get_without_token(&routes::event_picture(id)).await;
        assert_eq!(res.status, 404);
    }
}
