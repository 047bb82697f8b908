use crate::error::Error;
use crate::model::*;
use crate::validate;
use log::info;
use serde::de::DeserializeOwned;
use sled::transaction::{abort, Transactional};

// ids are big-endian so key order is id order and `last` yields the current maximum
pub(crate) fn serialize_id(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

pub(crate) fn deserialize_id<V: AsRef<[u8]>>(id: V) -> u64 {
    use std::convert::TryInto;
    u64::from_be_bytes(id.as_ref().try_into().unwrap())
}

pub(crate) fn decode<T: DeserializeOwned>(raw: &[u8]) -> Result<T, Error> {
    Ok(bincode::deserialize(raw)?)
}

pub(crate) const FILMS: &[u8] = b"films";
pub(crate) const USERS: &[u8] = b"users";
// index trees map the identity field (film name, user email) to the entity id
const FILMS_NAME: &[u8] = b"films_name";
const USERS_EMAIL: &[u8] = b"users_email";

// ids are never reused: highest key handed out so far + 1, starting at 1
fn next_id(tree: &sled::Tree) -> Result<u64, Error> {
    Ok(match tree.last()? {
        Some((key, _)) => deserialize_id(key) + 1,
        None => 1,
    })
}

pub trait FilmStore {
    type Error;
    fn all_films(&self) -> Result<Vec<Film>, Self::Error>;
    fn get_film(&self, id: u64) -> Result<Film, Self::Error>;
    fn create_film(&self, data: FilmData) -> Result<Film, Self::Error>;
    fn update_film(&self, data: FilmData) -> Result<Film, Self::Error>;
}

impl FilmStore for sled::Db {
    type Error = Error;

    fn all_films(&self) -> Result<Vec<Film>, Error> {
        let films = self.open_tree(FILMS)?;
        films.iter().values().map(|raw| decode(&raw?)).collect()
    }

    fn get_film(&self, id: u64) -> Result<Film, Error> {
        let films = self.open_tree(FILMS)?;
        match films.get(serialize_id(id))? {
            Some(raw) => decode(&raw),
            None => Err(Error::not_found(format!("film with id {} not found", id))),
        }
    }

    fn create_film(&self, data: FilmData) -> Result<Film, Error> {
        let films = self.open_tree(FILMS)?;
        let names = self.open_tree(FILMS_NAME)?;
        let mut film = validate::new_film(data)?;
        film.id = next_id(&films)?;
        let encoded = bincode::serialize(&film)?;
        (&films, &names).transaction(|(films, names)| {
            if names
                .insert(film.name.as_bytes(), &serialize_id(film.id))?
                .is_some()
            {
                return abort(Error::duplicate(format!(
                    "a film named {:?} already exists",
                    film.name
                )));
            }
            films.insert(&serialize_id(film.id), encoded.as_slice())?;
            Ok(())
        })?;
        info!("film {:?} created with id {}", film.name, film.id);
        Ok(film)
    }

    fn update_film(&self, data: FilmData) -> Result<Film, Error> {
        let films = self.open_tree(FILMS)?;
        let names = self.open_tree(FILMS_NAME)?;
        let id = match data.id {
            Some(id) => id,
            None => return Err(Error::missing_field("film id must be provided")),
        };
        let current: Film = match films.get(serialize_id(id))? {
            Some(raw) => decode(&raw)?,
            None => return Err(Error::not_found(format!("film with id {} not found", id))),
        };
        let film = validate::patch_film(&current, data)?;
        let encoded = bincode::serialize(&film)?;
        (&films, &names).transaction(|(films, names)| {
            if film.name != current.name {
                if let Some(holder) =
                    names.insert(film.name.as_bytes(), &serialize_id(film.id))?
                {
                    if deserialize_id(holder) != film.id {
                        return abort(Error::duplicate(format!(
                            "a film named {:?} already exists",
                            film.name
                        )));
                    }
                }
                names.remove(current.name.as_bytes())?;
            }
            films.insert(&serialize_id(film.id), encoded.as_slice())?;
            Ok(())
        })?;
        info!("film {} updated", film.id);
        Ok(film)
    }
}

pub trait UserStore {
    type Error;
    fn all_users(&self) -> Result<Vec<User>, Self::Error>;
    fn get_user(&self, id: u64) -> Result<User, Self::Error>;
    fn create_user(&self, data: UserData) -> Result<User, Self::Error>;
    fn update_user(&self, data: UserData) -> Result<User, Self::Error>;
}

impl UserStore for sled::Db {
    type Error = Error;

    fn all_users(&self) -> Result<Vec<User>, Error> {
        let users = self.open_tree(USERS)?;
        users.iter().values().map(|raw| decode(&raw?)).collect()
    }

    fn get_user(&self, id: u64) -> Result<User, Error> {
        let users = self.open_tree(USERS)?;
        match users.get(serialize_id(id))? {
            Some(raw) => decode(&raw),
            None => Err(Error::not_found(format!("user with id {} not found", id))),
        }
    }

    fn create_user(&self, data: UserData) -> Result<User, Error> {
        let users = self.open_tree(USERS)?;
        let emails = self.open_tree(USERS_EMAIL)?;
        let mut user = validate::new_user(data)?;
        user.id = next_id(&users)?;
        let encoded = bincode::serialize(&user)?;
        (&users, &emails).transaction(|(users, emails)| {
            if emails
                .insert(user.email.as_bytes(), &serialize_id(user.id))?
                .is_some()
            {
                return abort(Error::duplicate(format!(
                    "the email {:?} is already in use",
                    user.email
                )));
            }
            users.insert(&serialize_id(user.id), encoded.as_slice())?;
            Ok(())
        })?;
        info!("user {:?} created with id {}", user.login, user.id);
        Ok(user)
    }

    fn update_user(&self, data: UserData) -> Result<User, Error> {
        let users = self.open_tree(USERS)?;
        let emails = self.open_tree(USERS_EMAIL)?;
        let id = match data.id {
            Some(id) => id,
            None => return Err(Error::missing_field("user id must be provided")),
        };
        let current: User = match users.get(serialize_id(id))? {
            Some(raw) => decode(&raw)?,
            None => return Err(Error::not_found(format!("user with id {} not found", id))),
        };
        let user = validate::patch_user(&current, data)?;
        let encoded = bincode::serialize(&user)?;
        (&users, &emails).transaction(|(users, emails)| {
            if user.email != current.email {
                if let Some(holder) =
                    emails.insert(user.email.as_bytes(), &serialize_id(user.id))?
                {
                    if deserialize_id(holder) != user.id {
                        return abort(Error::duplicate(format!(
                            "the email {:?} is already in use",
                            user.email
                        )));
                    }
                }
                emails.remove(current.email.as_bytes())?;
            }
            users.insert(&serialize_id(user.id), encoded.as_slice())?;
            Ok(())
        })?;
        info!("user {} updated", user.id);
        Ok(user)
    }
}
