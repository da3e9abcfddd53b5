//! Registration, login and logout through the full router.

mod common;

use actix_web::http::{StatusCode, header};
use actix_web::test;

use blog_server::middleware::auth::SESSION_COOKIE;
use common::TestApp;
use yablog_core::domain::User;
use yablog_core::ports::{BaseRepository, PasswordService, UserRepository};

const PASSWORD: &str = "correct-horse-battery";

fn body_text(bytes: &[u8]) -> String {
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn registered(app: &TestApp, username: &str) -> User {
    let hash = app.state.passwords.hash(PASSWORD).unwrap();
    let user = User::new(username.to_string(), format!("{}@example.com", username), hash);
    app.store.users().save(user).await.unwrap()
}

#[actix_rt::test]
async fn register_creates_user_and_logs_in() {
    let app = TestApp::new();
    let service = service!(app);

    let req = test::TestRequest::post()
        .uri("/account/register/")
        .set_form([
            ("username", "grace"),
            ("email", "grace@Example.COM"),
            ("password1", PASSWORD),
            ("password2", PASSWORD),
        ])
        .to_request();
    let res = test::call_service(&service, req).await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/blog/");
    let cookie = res
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .unwrap()
        .into_owned();
    assert_eq!(cookie.http_only(), Some(true));

    let user = app
        .store
        .users()
        .find_by_username("grace")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.email, "grace@example.com");
    assert_ne!(user.password_hash, PASSWORD);

    // The new session opens the protected views.
    let req = test::TestRequest::get().uri("/blog/").cookie(cookie).to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn register_rejects_missing_or_duplicate_email() {
    let app = TestApp::new();
    app.user("ada").await;
    let service = service!(app);

    let req = test::TestRequest::post()
        .uri("/account/register/")
        .set_form([
            ("username", "grace"),
            ("password1", PASSWORD),
            ("password2", PASSWORD),
        ])
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(&test::read_body(res).await).contains("This field is required."));

    let req = test::TestRequest::post()
        .uri("/account/register/")
        .set_form([
            ("username", "grace"),
            ("email", "ada@example.com"),
            ("password1", PASSWORD),
            ("password2", PASSWORD),
        ])
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(
        body_text(&test::read_body(res).await)
            .contains("A user with that email already exists.")
    );

    assert!(
        app.store
            .users()
            .find_by_username("grace")
            .await
            .unwrap()
            .is_none()
    );
}

#[actix_rt::test]
async fn register_rejects_duplicate_username_and_weak_passwords() {
    let app = TestApp::new();
    app.user("ada").await;
    let service = service!(app);

    let req = test::TestRequest::post()
        .uri("/account/register/")
        .set_form([
            ("username", "ada"),
            ("email", "other@example.com"),
            ("password1", "12345678"),
            ("password2", "12345678"),
        ])
        .to_request();
    let page = body_text(&test::call_and_read_body(&service, req).await);
    assert!(page.contains("This password is entirely numeric."));

    let req = test::TestRequest::post()
        .uri("/account/register/")
        .set_form([
            ("username", "ada"),
            ("email", "other@example.com"),
            ("password1", PASSWORD),
            ("password2", PASSWORD),
        ])
        .to_request();
    let page = body_text(&test::call_and_read_body(&service, req).await);
    assert!(page.contains("A user with that username already exists."));
}

#[actix_rt::test]
async fn login_redirects_to_local_next() {
    let app = TestApp::new();
    registered(&app, "ada").await;
    let service = service!(app);

    let req = test::TestRequest::post()
        .uri("/account/login/")
        .set_form([
            ("username", "ada"),
            ("password", PASSWORD),
            ("next", "/search/"),
        ])
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/search/");
    assert!(res.response().cookies().any(|c| c.name() == SESSION_COOKIE));

    let req = test::TestRequest::post()
        .uri("/account/login/")
        .set_form([
            ("username", "ada"),
            ("password", PASSWORD),
            ("next", "https://evil.example.com/"),
        ])
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/blog/");
}

#[actix_rt::test]
async fn login_rejects_bad_credentials() {
    let app = TestApp::new();
    registered(&app, "ada").await;
    let service = service!(app);

    for (username, password) in [("ada", "wrong-password"), ("nobody", PASSWORD)] {
        let req = test::TestRequest::post()
            .uri("/account/login/")
            .set_form([("username", username), ("password", password)])
            .to_request();
        let res = test::call_service(&service, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        assert!(!res.response().cookies().any(|c| c.name() == SESSION_COOKIE));
        assert!(
            body_text(&test::read_body(res).await)
                .contains("Please enter a correct username and password.")
        );
    }
}

#[actix_rt::test]
async fn login_form_keeps_next() {
    let app = TestApp::new();
    let service = service!(app);

    let req = test::TestRequest::get()
        .uri("/account/login/?next=/blog/")
        .to_request();
    let page = body_text(&test::call_and_read_body(&service, req).await);

    assert!(page.contains(r#"name="next" value="/blog/""#));
}

#[actix_rt::test]
async fn logout_clears_session() {
    let app = TestApp::new();
    let ada = app.user("ada").await;
    let service = service!(app);

    let req = test::TestRequest::get()
        .uri("/account/confirm_logout/")
        .cookie(app.session(&ada))
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/account/logout/")
        .cookie(app.session(&ada))
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let removal = res
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .unwrap();
    assert_eq!(removal.value(), "");
    assert!(body_text(&test::read_body(res).await).contains("Logged out"));

    let req = test::TestRequest::get().uri("/account/logout/").to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}
