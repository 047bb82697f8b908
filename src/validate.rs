use crate::error::Error;
use crate::model::{Film, FilmData, User, UserData};
use chrono::{Local, NaiveDate};
use std::collections::HashSet;

const MAX_DESCRIPTION: usize = 200;

// date of the first public film screening
fn earliest_release() -> NaiveDate {
    NaiveDate::from_ymd_opt(1895, 12, 28).unwrap()
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| Error::invalid_value(format!("{} is not a yyyy-MM-dd date: {}", field, raw)))
}

pub fn new_film(data: FilmData) -> Result<Film, Error> {
    let name = match data.name {
        Some(name) if !is_blank(&name) => name,
        _ => return Err(Error::missing_field("film name must be provided")),
    };
    let description = match data.description {
        Some(description) if !is_blank(&description) => description,
        _ => return Err(Error::missing_field("film description must be provided")),
    };
    check_description(&description)?;
    let release_date = match data.release_date {
        Some(raw) if !is_blank(&raw) => parse_date("release date", &raw)?,
        _ => return Err(Error::missing_field("film release date must be provided")),
    };
    check_release_date(release_date)?;
    let duration = match data.duration {
        Some(duration) => duration,
        None => return Err(Error::missing_field("film duration must be provided")),
    };
    check_duration(duration)?;
    Ok(Film {
        id: 0,
        name,
        description,
        release_date,
        duration,
        likes: HashSet::new(),
    })
}

pub fn patch_film(current: &Film, data: FilmData) -> Result<Film, Error> {
    let mut film = current.clone();
    if let Some(name) = data.name {
        if is_blank(&name) {
            return Err(Error::missing_field("film name must not be blank"));
        }
        film.name = name;
    }
    if let Some(description) = data.description {
        if is_blank(&description) {
            return Err(Error::missing_field("film description must not be blank"));
        }
        check_description(&description)?;
        film.description = description;
    }
    if let Some(raw) = data.release_date {
        let release_date = parse_date("release date", &raw)?;
        check_release_date(release_date)?;
        film.release_date = release_date;
    }
    if let Some(duration) = data.duration {
        check_duration(duration)?;
        film.duration = duration;
    }
    Ok(film)
}

pub fn new_user(data: UserData) -> Result<User, Error> {
    let email = match data.email {
        Some(email) if !is_blank(&email) => email,
        _ => return Err(Error::missing_field("user email must be provided")),
    };
    check_email(&email)?;
    let login = match data.login {
        Some(login) if !is_blank(&login) => login,
        _ => return Err(Error::missing_field("user login must be provided")),
    };
    check_login(&login)?;
    let birthday = match data.birthday {
        Some(raw) if !is_blank(&raw) => parse_date("birthday", &raw)?,
        _ => return Err(Error::missing_field("user birthday must be provided")),
    };
    check_birthday(birthday)?;
    let name = match data.name {
        Some(name) if !is_blank(&name) => name,
        _ => login.clone(),
    };
    Ok(User {
        id: 0,
        email,
        login,
        name,
        birthday,
        friends: HashSet::new(),
    })
}

pub fn patch_user(current: &User, data: UserData) -> Result<User, Error> {
    let mut user = current.clone();
    if let Some(email) = data.email {
        if is_blank(&email) {
            return Err(Error::missing_field("user email must not be blank"));
        }
        check_email(&email)?;
        user.email = email;
    }
    if let Some(login) = data.login {
        if is_blank(&login) {
            return Err(Error::missing_field("user login must not be blank"));
        }
        check_login(&login)?;
        user.login = login;
    }
    if let Some(raw) = data.birthday {
        let birthday = parse_date("birthday", &raw)?;
        check_birthday(birthday)?;
        user.birthday = birthday;
    }
    if let Some(name) = data.name {
        // a blank display name falls back to the login, same as on creation
        user.name = if is_blank(&name) { user.login.clone() } else { name };
    }
    Ok(user)
}

fn check_description(description: &str) -> Result<(), Error> {
    if description.chars().count() > MAX_DESCRIPTION {
        return Err(Error::invalid_value(format!(
            "film description is longer than {} characters",
            MAX_DESCRIPTION
        )));
    }
    Ok(())
}

fn check_release_date(release_date: NaiveDate) -> Result<(), Error> {
    if release_date < earliest_release() {
        return Err(Error::invalid_value(
            "film release date is earlier than 1895-12-28",
        ));
    }
    Ok(())
}

fn check_duration(duration: i64) -> Result<(), Error> {
    if duration <= 0 {
        return Err(Error::invalid_value("film duration must be positive"));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), Error> {
    if !email.contains('@') {
        return Err(Error::invalid_value("user email is missing '@'"));
    }
    Ok(())
}

fn check_login(login: &str) -> Result<(), Error> {
    if login.contains(' ') {
        return Err(Error::invalid_value("user login must not contain spaces"));
    }
    Ok(())
}

fn check_birthday(birthday: NaiveDate) -> Result<(), Error> {
    if birthday > Local::now().date_naive() {
        return Err(Error::invalid_value("user birthday is in the future"));
    }
    Ok(())
}
