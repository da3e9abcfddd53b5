//! Blog views driven through the full router over the in-memory store.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use actix_web::http::{StatusCode, header};
use actix_web::test;
use async_trait::async_trait;

use common::{MAIL_FROM, SITE_URL, TestApp, day};
use yablog_core::domain::Comment;
use yablog_core::ports::{BaseRepository, RateLimitError, RateLimitResult, RateLimiter};

fn body_text(bytes: &[u8]) -> String {
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[actix_rt::test]
async fn anonymous_requests_redirect_to_login() {
    let app = TestApp::new();
    let service = service!(app);

    for uri in ["/blog/", "/search/?query=rust", "/posts/tag/rust/"] {
        let res = test::call_service(&service, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER, "{}", uri);
        let location = res.headers().get(header::LOCATION).unwrap().to_str().unwrap();
        assert!(location.starts_with("/account/login/?next=/"), "{}", location);
    }
}

#[actix_rt::test]
async fn index_redirects_logged_in_users() {
    let app = TestApp::new();
    let ada = app.user("ada").await;
    let service = service!(app);

    let res = test::call_service(&service, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/").cookie(app.session(&ada)).to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/blog/");
}

#[actix_rt::test]
async fn post_list_hides_drafts_and_paginates() {
    let app = TestApp::new();
    let ada = app.user("ada").await;
    for d in 1..=4 {
        app.post(&ada, &format!("Post number {}", d), day(d), &[]).await;
    }
    app.draft(&ada, "Secret draft").await;
    let service = service!(app);
    let session = app.session(&ada);

    let req = test::TestRequest::get().uri("/blog/").cookie(session.clone()).to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page = body_text(&test::read_body(res).await);
    assert!(page.contains("Post number 4"));
    assert!(page.contains("Post number 2"));
    assert!(!page.contains("Post number 1"));
    assert!(!page.contains("Secret draft"));
    assert!(page.contains("Page 1 of 2."));

    let req = test::TestRequest::get()
        .uri("/blog/?page=last")
        .cookie(session.clone())
        .to_request();
    let page = body_text(&test::call_and_read_body(&service, req).await);
    assert!(page.contains("Post number 1"));
    assert!(page.contains("Page 2 of 2."));

    for uri in ["/blog/?page=3", "/blog/?page=0", "/blog/?page=abc"] {
        let req = test::TestRequest::get().uri(uri).cookie(session.clone()).to_request();
        let res = test::call_service(&service, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[actix_rt::test]
async fn empty_post_list_has_a_first_page() {
    let app = TestApp::new();
    let ada = app.user("ada").await;
    let service = service!(app);

    let req = test::TestRequest::get().uri("/blog/").cookie(app.session(&ada)).to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(&test::read_body(res).await).contains("There are no posts yet."));
}

#[actix_rt::test]
async fn tag_filter() {
    let app = TestApp::new();
    let ada = app.user("ada").await;
    let rust = app.tag("Rust").await;
    app.post(&ada, "Tagged post", day(1), &[rust.clone()]).await;
    app.post(&ada, "Untagged post", day(2), &[]).await;
    let service = service!(app);
    let session = app.session(&ada);

    let req = test::TestRequest::get().uri("/posts/tag/rust/").cookie(session.clone()).to_request();
    let page = body_text(&test::call_and_read_body(&service, req).await);
    assert!(page.contains(r#"Posts tagged with "Rust""#));
    assert!(page.contains("Tagged post"));
    assert!(!page.contains("Untagged post"));

    let req = test::TestRequest::get().uri("/posts/tag/missing/").cookie(session).to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn post_detail_matches_publish_date() {
    let app = TestApp::new();
    let ada = app.user("ada").await;
    let post = app.post(&ada, "Lifetimes", day(7), &[]).await;
    let draft = app.draft(&ada, "Draft lifetimes").await;
    let service = service!(app);
    let session = app.session(&ada);

    let req = test::TestRequest::get()
        .uri(&post.canonical_path())
        .cookie(session.clone())
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page = body_text(&test::read_body(res).await);
    assert!(page.contains("<h1>Lifetimes</h1>"));
    assert!(page.contains("by ada"));

    for uri in [
        "/2024/5/8/lifetimes/".to_string(),
        "/2024/13/7/lifetimes/".to_string(),
        draft.canonical_path(),
    ] {
        let req = test::TestRequest::get().uri(&uri).cookie(session.clone()).to_request();
        let res = test::call_service(&service, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[actix_rt::test]
async fn similar_posts_order_by_shared_tags_then_recency() {
    let app = TestApp::new();
    let ada = app.user("ada").await;
    let rust = app.tag("Rust").await;
    let web = app.tag("Web").await;

    let post = app.post(&ada, "Actix basics", day(1), &[rust.clone(), web.clone()]).await;
    app.post(&ada, "Older twin", day(2), &[rust.clone(), web.clone()]).await;
    app.post(&ada, "Newer twin", day(3), &[rust.clone(), web.clone()]).await;
    app.post(&ada, "Cousin", day(5), &[rust.clone()]).await;
    app.post(&ada, "Stranger", day(6), &[]).await;
    let service = service!(app);

    let req = test::TestRequest::get()
        .uri(&post.canonical_path())
        .cookie(app.session(&ada))
        .to_request();
    let page = body_text(&test::call_and_read_body(&service, req).await);

    let newer = page.find("Newer twin").unwrap();
    let older = page.find("Older twin").unwrap();
    let cousin = page.find("Cousin").unwrap();
    assert!(newer < older && older < cousin);
    assert!(!page.contains("Stranger"));
}

#[actix_rt::test]
async fn search_uses_trigram_threshold_and_skips_drafts() {
    let app = TestApp::new();
    let ada = app.user("ada").await;
    app.post(&ada, "Rust ownership explained", day(1), &[]).await;
    app.post(&ada, "Cooking pasta", day(2), &[]).await;
    app.draft(&ada, "Ownership draft").await;
    let service = service!(app);
    let session = app.session(&ada);

    let req = test::TestRequest::get()
        .uri("/search/?query=ownership")
        .cookie(session.clone())
        .to_request();
    let page = body_text(&test::call_and_read_body(&service, req).await);
    assert!(page.contains("Found 1 result(s)"));
    assert!(page.contains("Rust ownership explained"));
    assert!(!page.contains("Cooking pasta"));
    assert!(!page.contains("Ownership draft"));

    let req = test::TestRequest::get()
        .uri("/search/?query=kubernetes")
        .cookie(session.clone())
        .to_request();
    let page = body_text(&test::call_and_read_body(&service, req).await);
    assert!(page.contains("Found 0 result(s)"));

    let req = test::TestRequest::get().uri("/search/?query=").cookie(session).to_request();
    let page = body_text(&test::call_and_read_body(&service, req).await);
    assert!(page.contains("This field is required."));
}

#[actix_rt::test]
async fn share_sends_mail_with_account_reply_to() {
    let app = TestApp::new();
    let ada = app.user("ada").await;
    let post = app.post(&ada, "Traits", day(4), &[]).await;
    let service = service!(app);

    let req = test::TestRequest::post()
        .uri(&format!("/{}/share/", post.id))
        .cookie(app.session(&ada))
        .set_form([
            ("name", "Ada"),
            ("to", "friend@example.com"),
            ("comments", "Worth it"),
        ])
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(&test::read_body(res).await).contains("E-mail successfully sent"));

    let sent = app.mailer.sent().await;
    assert_eq!(sent.len(), 1);
    let message = &sent[0];
    assert_eq!(message.from, MAIL_FROM);
    assert_eq!(message.to, vec!["friend@example.com".to_string()]);
    assert_eq!(message.reply_to.as_deref(), Some("ada@example.com"));
    assert_eq!(
        message.subject,
        "Ada (ada@example.com) recommends you read Traits"
    );
    assert_eq!(
        message.body,
        format!(
            "Read Traits at {}/2024/5/4/traits/ \n\nAda's comments: Worth it",
            SITE_URL
        )
    );
}

#[actix_rt::test]
async fn share_rejects_invalid_form_without_sending() {
    let app = TestApp::new();
    let ada = app.user("ada").await;
    let post = app.post(&ada, "Traits", day(4), &[]).await;
    let draft = app.draft(&ada, "Hidden").await;
    let service = service!(app);
    let session = app.session(&ada);

    let req = test::TestRequest::post()
        .uri(&format!("/{}/share/", post.id))
        .cookie(session.clone())
        .set_form([("name", "Ada"), ("to", "not-an-email")])
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(&test::read_body(res).await).contains("Enter a valid email address."));
    assert!(app.mailer.sent().await.is_empty());

    let req = test::TestRequest::get()
        .uri(&format!("/{}/share/", draft.id))
        .cookie(session)
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

struct Exhausted;

#[async_trait]
impl RateLimiter for Exhausted {
    async fn check(&self, _key: &str) -> Result<RateLimitResult, RateLimitError> {
        Ok(RateLimitResult {
            allowed: false,
            reset_after: Duration::from_secs(60),
        })
    }
}

#[actix_rt::test]
async fn share_is_rate_limited() {
    let mut app = TestApp::new();
    app.state = app.state.clone().with_share_limiter(Arc::new(Exhausted));
    let ada = app.user("ada").await;
    let post = app.post(&ada, "Traits", day(4), &[]).await;
    let service = service!(app);

    let req = test::TestRequest::post()
        .uri(&format!("/{}/share/", post.id))
        .cookie(app.session(&ada))
        .set_form([("name", "Ada"), ("to", "friend@example.com")])
        .to_request();
    let res = test::call_service(&service, req).await;

    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.headers().get(header::RETRY_AFTER).unwrap(), "60");
    assert!(app.mailer.sent().await.is_empty());
}

/// Allows everything and counts how often it was consulted.
#[derive(Default)]
struct Counting(AtomicUsize);

#[async_trait]
impl RateLimiter for Counting {
    async fn check(&self, _key: &str) -> Result<RateLimitResult, RateLimitError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(RateLimitResult {
            allowed: true,
            reset_after: Duration::ZERO,
        })
    }
}

#[actix_rt::test]
async fn invalid_shares_do_not_use_the_quota() {
    let mut app = TestApp::new();
    let limiter = Arc::new(Counting::default());
    app.state = app.state.clone().with_share_limiter(limiter.clone());
    let ada = app.user("ada").await;
    let post = app.post(&ada, "Traits", day(4), &[]).await;
    let service = service!(app);

    for to in ["not-an-email", "a<b@example.com", "a,b@example.com"] {
        let req = test::TestRequest::post()
            .uri(&format!("/{}/share/", post.id))
            .cookie(app.session(&ada))
            .set_form([("name", "Ada"), ("to", to)])
            .to_request();
        let res = test::call_service(&service, req).await;
        assert_eq!(res.status(), StatusCode::OK, "{to}");
        assert!(body_text(&test::read_body(res).await).contains("Enter a valid email address."));
    }
    assert_eq!(limiter.0.load(Ordering::SeqCst), 0);
    assert!(app.mailer.sent().await.is_empty());

    let req = test::TestRequest::post()
        .uri(&format!("/{}/share/", post.id))
        .cookie(app.session(&ada))
        .set_form([("name", "Ada"), ("to", "friend@example.com")])
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(limiter.0.load(Ordering::SeqCst), 1);
    assert_eq!(app.mailer.sent().await.len(), 1);
}

#[actix_rt::test]
async fn comments_are_added_and_listed() {
    let app = TestApp::new();
    let ada = app.user("ada").await;
    let post = app.post(&ada, "Closures", day(9), &[]).await;
    let service = service!(app);
    let session = app.session(&ada);

    let req = test::TestRequest::post()
        .uri(&format!("/{}/comment/", post.id))
        .cookie(session.clone())
        .set_form([("body", "Great read")])
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(&test::read_body(res).await).contains("Your comment has been added."));

    let req = test::TestRequest::get()
        .uri(&post.canonical_path())
        .cookie(session.clone())
        .to_request();
    let page = body_text(&test::call_and_read_body(&service, req).await);
    assert!(page.contains("1 comment(s)"));
    assert!(page.contains("Comment by ada@example.com"));
    assert!(page.contains("Great read"));

    let req = test::TestRequest::post()
        .uri(&format!("/{}/comment/", post.id))
        .cookie(session.clone())
        .set_form([("body", "   ")])
        .to_request();
    let page = body_text(&test::call_and_read_body(&service, req).await);
    assert!(page.contains("This field is required."));

    let req = test::TestRequest::get()
        .uri(&format!("/{}/comment/", post.id))
        .cookie(session)
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[actix_rt::test]
async fn only_the_owner_can_delete_a_comment() {
    let app = TestApp::new();
    let ada = app.user("ada").await;
    let bob = app.user("bob").await;
    let post = app.post(&ada, "Iterators", day(10), &[]).await;
    let comment = app
        .store
        .comments()
        .save(Comment::new(
            post.id,
            ada.id,
            ada.email.clone(),
            "Mine".to_string(),
        ))
        .await
        .unwrap();
    let service = service!(app);
    let uri = format!("/comment/{}/delete/", comment.id);

    for req in [
        test::TestRequest::get().uri(&uri).cookie(app.session(&bob)).to_request(),
        test::TestRequest::post().uri(&uri).cookie(app.session(&bob)).to_request(),
    ] {
        let res = test::call_service(&service, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
    assert!(app.store.comments().find_by_id(comment.id).await.unwrap().is_some());

    let req = test::TestRequest::get().uri(&uri).cookie(app.session(&ada)).to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let req = test::TestRequest::post().uri(&uri).cookie(app.session(&ada)).to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        res.headers().get(header::LOCATION).unwrap().to_str().unwrap(),
        post.canonical_path()
    );
    assert!(app.store.comments().find_by_id(comment.id).await.unwrap().is_none());
}

#[actix_rt::test]
async fn feed_lists_latest_published_posts() {
    let app = TestApp::new();
    let ada = app.user("ada").await;
    for d in 1..=6 {
        app.post(&ada, &format!("Entry {}", d), day(d), &[]).await;
    }
    app.draft(&ada, "Draft entry").await;
    let service = service!(app);

    let res = test::call_service(&service, test::TestRequest::get().uri("/feed/").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(
        res.headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("application/rss+xml")
    );

    let xml = body_text(&test::read_body(res).await);
    assert_eq!(xml.matches("<item>").count(), 5);
    assert!(xml.contains("<title>Entry 6</title>"));
    assert!(!xml.contains("<title>Entry 1</title>"));
    assert!(!xml.contains("Draft entry"));
    assert!(xml.contains(&format!("<link>{}/2024/5/6/entry-6/</link>", SITE_URL)));
}

#[actix_rt::test]
async fn unknown_routes_render_not_found_page() {
    let app = TestApp::new();
    let service = service!(app);

    let res = test::call_service(
        &service,
        test::TestRequest::get().uri("/nowhere/at/all/").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(body_text(&test::read_body(res).await).contains("404 Not Found"));
}
