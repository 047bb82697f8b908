mod database;
mod error;
mod model;
mod social;
mod validate;

use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use database::*;
use error::Error;
use model::*;
use serde::Deserialize;
use social::*;

type Db = web::Data<sled::Db>;

async fn films_all(db: Db) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(db.all_films()?))
}

async fn film_by_id(db: Db, id: web::Path<u64>) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(db.get_film(*id)?))
}

async fn film_create(db: Db, data: web::Json<FilmData>) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(db.create_film(data.into_inner())?))
}

async fn film_update(db: Db, data: web::Json<FilmData>) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(db.update_film(data.into_inner())?))
}

async fn like_add(db: Db, path: web::Path<(u64, u64)>) -> Result<HttpResponse, Error> {
    let (film_id, user_id) = path.into_inner();
    db.add_like(film_id, user_id)?;
    Ok(HttpResponse::Ok().finish())
}

async fn like_remove(db: Db, path: web::Path<(u64, u64)>) -> Result<HttpResponse, Error> {
    let (film_id, user_id) = path.into_inner();
    db.remove_like(film_id, user_id)?;
    Ok(HttpResponse::Ok().finish())
}

#[derive(Deserialize)]
struct PopularParams {
    count: Option<usize>,
}

async fn films_popular(db: Db, params: web::Query<PopularParams>) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(db.most_liked(params.count.unwrap_or(10))?))
}

async fn users_all(db: Db) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(db.all_users()?))
}

async fn user_by_id(db: Db, id: web::Path<u64>) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(db.get_user(*id)?))
}

async fn user_create(db: Db, data: web::Json<UserData>) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(db.create_user(data.into_inner())?))
}

async fn user_update(db: Db, data: web::Json<UserData>) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(db.update_user(data.into_inner())?))
}

async fn friend_add(db: Db, path: web::Path<(u64, u64)>) -> Result<HttpResponse, Error> {
    let (user_id, friend_id) = path.into_inner();
    db.add_friend(user_id, friend_id)?;
    Ok(HttpResponse::Ok().finish())
}

async fn friend_remove(db: Db, path: web::Path<(u64, u64)>) -> Result<HttpResponse, Error> {
    let (user_id, friend_id) = path.into_inner();
    db.remove_friend(user_id, friend_id)?;
    Ok(HttpResponse::Ok().finish())
}

async fn user_friends(db: Db, id: web::Path<u64>) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(db.friends_of(*id)?))
}

async fn common_friends(db: Db, path: web::Path<(u64, u64)>) -> Result<HttpResponse, Error> {
    let (user_id, other_id) = path.into_inner();
    Ok(HttpResponse::Ok().json(db.common_friends(user_id, other_id)?))
}

fn routes(cfg: &mut web::ServiceConfig) {
    // "/films/popular" before "/films/{id}": routes match in registration order
    cfg.route("/films", web::get().to(films_all))
        .route("/films", web::post().to(film_create))
        .route("/films", web::put().to(film_update))
        .route("/films/popular", web::get().to(films_popular))
        .route("/films/{id}", web::get().to(film_by_id))
        .route("/films/{id}/like/{user_id}", web::put().to(like_add))
        .route("/films/{id}/like/{user_id}", web::delete().to(like_remove))
        .route("/users", web::get().to(users_all))
        .route("/users", web::post().to(user_create))
        .route("/users", web::put().to(user_update))
        .route("/users/{id}", web::get().to(user_by_id))
        .route("/users/{id}/friends", web::get().to(user_friends))
        .route("/users/{id}/friends/{friend_id}", web::put().to(friend_add))
        .route(
            "/users/{id}/friends/{friend_id}",
            web::delete().to(friend_remove),
        )
        .route(
            "/users/{id}/friends/common/{other_id}",
            web::get().to(common_friends),
        );
}

#[actix_rt::main]
async fn main() -> std::io::Result<()> {
    std::env::set_var("RUST_LOG", "filmorate=debug,actix_web=info");
    env_logger::init();

    let db = sled::Config::new()
        .temporary(true)
        .open()
        .expect("could not open database");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .data(db.clone())
            .configure(routes)
    })
    .bind("127.0.0.1:8080")?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::json;

    fn db() -> sled::Db {
        sled::Config::new().temporary(true).open().unwrap()
    }

    fn film_body(name: &str) -> serde_json::Value {
        json!({
            "name": name,
            "description": "description",
            "releaseDate": "2010-10-10",
            "duration": 90
        })
    }

    fn user_body(email: &str, login: &str) -> serde_json::Value {
        json!({
            "email": email,
            "login": login,
            "birthday": "1990-01-01"
        })
    }

    #[actix_rt::test]
    async fn create_and_fetch_film() {
        let mut app = test::init_service(App::new().data(db()).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/films")
            .set_json(&film_body("Arrival"))
            .to_request();
        let film: Film = test::read_response_json(&mut app, req).await;
        assert_eq!(film.id, 1);
        assert_eq!(film.name, "Arrival");

        let req = test::TestRequest::get().uri("/films/1").to_request();
        let fetched: Film = test::read_response_json(&mut app, req).await;
        assert_eq!(fetched, film);
    }

    #[actix_rt::test]
    async fn invalid_film_is_a_bad_request() {
        let mut app = test::init_service(App::new().data(db()).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/films")
            .set_json(&json!({
                "name": "",
                "description": "description",
                "releaseDate": "2010-10-10",
                "duration": 90
            }))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = test::read_body(resp).await;
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "missing required field");
        assert!(body["description"].as_str().unwrap().contains("name"));
    }

    #[actix_rt::test]
    async fn duplicate_film_is_a_conflict() {
        let mut app = test::init_service(App::new().data(db()).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/films")
            .set_json(&film_body("Arrival"))
            .to_request();
        assert!(test::call_service(&mut app, req).await.status().is_success());

        let req = test::TestRequest::post()
            .uri("/films")
            .set_json(&film_body("Arrival"))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body = test::read_body(resp).await;
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "duplicate");
    }

    #[actix_rt::test]
    async fn unknown_film_is_not_found() {
        let mut app = test::init_service(App::new().data(db()).configure(routes)).await;

        let req = test::TestRequest::get().uri("/films/5").to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = test::read_body(resp).await;
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "not found");
    }

    #[actix_rt::test]
    async fn popular_returns_the_most_liked_first() {
        let mut app = test::init_service(App::new().data(db()).configure(routes)).await;

        for name in &["first", "second"] {
            let req = test::TestRequest::post()
                .uri("/films")
                .set_json(&film_body(name))
                .to_request();
            test::call_service(&mut app, req).await;
        }
        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(&user_body("a@b", "a"))
            .to_request();
        test::call_service(&mut app, req).await;

        let req = test::TestRequest::put().uri("/films/2/like/1").to_request();
        assert!(test::call_service(&mut app, req).await.status().is_success());

        let req = test::TestRequest::get()
            .uri("/films/popular?count=1")
            .to_request();
        let top: Vec<Film> = test::read_response_json(&mut app, req).await;
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id, 2);

        let req = test::TestRequest::get().uri("/films/popular").to_request();
        let all: Vec<Film> = test::read_response_json(&mut app, req).await;
        assert_eq!(all.len(), 2);
    }

    #[actix_rt::test]
    async fn friend_endpoints_are_symmetric() {
        let mut app = test::init_service(App::new().data(db()).configure(routes)).await;

        for (email, login) in &[("a@b", "a"), ("c@d", "c")] {
            let req = test::TestRequest::post()
                .uri("/users")
                .set_json(&user_body(email, login))
                .to_request();
            test::call_service(&mut app, req).await;
        }

        let req = test::TestRequest::put().uri("/users/1/friends/2").to_request();
        assert!(test::call_service(&mut app, req).await.status().is_success());

        let req = test::TestRequest::get().uri("/users/2/friends").to_request();
        let friends: Vec<User> = test::read_response_json(&mut app, req).await;
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].id, 1);

        let req = test::TestRequest::delete()
            .uri("/users/2/friends/1")
            .to_request();
        assert!(test::call_service(&mut app, req).await.status().is_success());

        let req = test::TestRequest::get().uri("/users/1/friends").to_request();
        let friends: Vec<User> = test::read_response_json(&mut app, req).await;
        assert!(friends.is_empty());
    }

    #[actix_rt::test]
    async fn common_friends_over_http() {
        let mut app = test::init_service(App::new().data(db()).configure(routes)).await;

        for (email, login) in &[("a@b", "a"), ("c@d", "c"), ("e@f", "e")] {
            let req = test::TestRequest::post()
                .uri("/users")
                .set_json(&user_body(email, login))
                .to_request();
            test::call_service(&mut app, req).await;
        }
        for uri in &["/users/1/friends/3", "/users/2/friends/3"] {
            let req = test::TestRequest::put().uri(uri).to_request();
            test::call_service(&mut app, req).await;
        }

        let req = test::TestRequest::get()
            .uri("/users/1/friends/common/2")
            .to_request();
        let common: Vec<User> = test::read_response_json(&mut app, req).await;
        assert_eq!(common.len(), 1);
        assert_eq!(common[0].id, 3);
    }

    #[actix_rt::test]
    async fn befriending_an_unknown_user_is_not_found() {
        let mut app = test::init_service(App::new().data(db()).configure(routes)).await;

        let req = test::TestRequest::put().uri("/users/1/friends/2").to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn user_update_is_partial() {
        let mut app = test::init_service(App::new().data(db()).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(&user_body("a@b", "a"))
            .to_request();
        let user: User = test::read_response_json(&mut app, req).await;
        // no display name in the request, so it defaults to the login
        assert_eq!(user.name, "a");

        let req = test::TestRequest::put()
            .uri("/users")
            .set_json(&json!({ "id": user.id, "email": "new@b" }))
            .to_request();
        let updated: User = test::read_response_json(&mut app, req).await;
        assert_eq!(updated.email, "new@b");
        assert_eq!(updated.login, user.login);
        assert_eq!(updated.name, user.name);
        assert_eq!(updated.birthday, user.birthday);
    }
}
