use crate::database::{serialize_id, FilmStore, UserStore, FILMS, USERS};
use crate::error::Error;
use crate::model::{Film, User};
use log::info;
use sled::transaction::abort;
use sled::Transactional;

pub trait SocialDb {
    type Error;
    fn add_like(&self, film_id: u64, user_id: u64) -> Result<(), Self::Error>;
    fn remove_like(&self, film_id: u64, user_id: u64) -> Result<(), Self::Error>;
    fn most_liked(&self, count: usize) -> Result<Vec<Film>, Self::Error>;
    fn add_friend(&self, user_id: u64, friend_id: u64) -> Result<(), Self::Error>;
    fn remove_friend(&self, user_id: u64, friend_id: u64) -> Result<(), Self::Error>;
    fn friends_of(&self, user_id: u64) -> Result<Vec<User>, Self::Error>;
    fn common_friends(&self, user_id: u64, other_id: u64) -> Result<Vec<User>, Self::Error>;
}

impl SocialDb for sled::Db {
    type Error = Error;

    fn add_like(&self, film_id: u64, user_id: u64) -> Result<(), Error> {
        let films = self.open_tree(FILMS)?;
        let users = self.open_tree(USERS)?;
        (&films, &users).transaction(|(films, users)| {
            if users.get(serialize_id(user_id))?.is_none() {
                return abort(Error::not_found(format!(
                    "user with id {} not found",
                    user_id
                )));
            }
            let raw = match films.get(serialize_id(film_id))? {
                Some(raw) => raw,
                None => {
                    return abort(Error::not_found(format!(
                        "film with id {} not found",
                        film_id
                    )))
                }
            };
            let mut film: Film = bincode::deserialize(&raw).unwrap();
            film.likes.insert(user_id);
            films.insert(&serialize_id(film_id), bincode::serialize(&film).unwrap())?;
            Ok(())
        })?;
        info!("user {} liked film {}", user_id, film_id);
        Ok(())
    }

    fn remove_like(&self, film_id: u64, user_id: u64) -> Result<(), Error> {
        let films = self.open_tree(FILMS)?;
        let users = self.open_tree(USERS)?;
        (&films, &users).transaction(|(films, users)| {
            let raw = match films.get(serialize_id(film_id))? {
                Some(raw) => raw,
                None => {
                    return abort(Error::not_found(format!(
                        "film with id {} not found",
                        film_id
                    )))
                }
            };
            let mut film: Film = bincode::deserialize(&raw).unwrap();
            if !film.likes.contains(&user_id) {
                return abort(Error::not_found(format!(
                    "film {} has no like from user {}",
                    film_id, user_id
                )));
            }
            if users.get(serialize_id(user_id))?.is_none() {
                return abort(Error::not_found(format!(
                    "user with id {} not found",
                    user_id
                )));
            }
            film.likes.remove(&user_id);
            films.insert(&serialize_id(film_id), bincode::serialize(&film).unwrap())?;
            Ok(())
        })?;
        info!("user {} unliked film {}", user_id, film_id);
        Ok(())
    }

    fn most_liked(&self, count: usize) -> Result<Vec<Film>, Error> {
        // stable sort over the id-ordered listing, so ties stay in id order
        let mut films = self.all_films()?;
        films.sort_by(|a, b| b.likes.len().cmp(&a.likes.len()));
        films.truncate(count);
        Ok(films)
    }

    fn add_friend(&self, user_id: u64, friend_id: u64) -> Result<(), Error> {
        if user_id == friend_id {
            return Err(Error::invalid_value(format!(
                "user {} cannot befriend themselves",
                user_id
            )));
        }
        let users = self.open_tree(USERS)?;
        users.transaction(|users| {
            let mut user: User = match users.get(serialize_id(user_id))? {
                Some(raw) => bincode::deserialize(&raw).unwrap(),
                None => {
                    return abort(Error::not_found(format!(
                        "user with id {} not found",
                        user_id
                    )))
                }
            };
            let mut friend: User = match users.get(serialize_id(friend_id))? {
                Some(raw) => bincode::deserialize(&raw).unwrap(),
                None => {
                    return abort(Error::not_found(format!(
                        "user with id {} not found",
                        friend_id
                    )))
                }
            };
            user.friends.insert(friend_id);
            friend.friends.insert(user_id);
            users.insert(&serialize_id(user_id), bincode::serialize(&user).unwrap())?;
            users.insert(&serialize_id(friend_id), bincode::serialize(&friend).unwrap())?;
            Ok(())
        })?;
        info!("users {} and {} are now friends", user_id, friend_id);
        Ok(())
    }

    fn remove_friend(&self, user_id: u64, friend_id: u64) -> Result<(), Error> {
        let users = self.open_tree(USERS)?;
        users.transaction(|users| {
            let mut user: User = match users.get(serialize_id(user_id))? {
                Some(raw) => bincode::deserialize(&raw).unwrap(),
                None => {
                    return abort(Error::not_found(format!(
                        "user with id {} not found",
                        user_id
                    )))
                }
            };
            let mut friend: User = match users.get(serialize_id(friend_id))? {
                Some(raw) => bincode::deserialize(&raw).unwrap(),
                None => {
                    return abort(Error::not_found(format!(
                        "user with id {} not found",
                        friend_id
                    )))
                }
            };
            user.friends.remove(&friend_id);
            friend.friends.remove(&user_id);
            users.insert(&serialize_id(user_id), bincode::serialize(&user).unwrap())?;
            users.insert(&serialize_id(friend_id), bincode::serialize(&friend).unwrap())?;
            Ok(())
        })?;
        info!("users {} and {} are no longer friends", user_id, friend_id);
        Ok(())
    }

    fn friends_of(&self, user_id: u64) -> Result<Vec<User>, Error> {
        let user = self.get_user(user_id)?;
        let mut friends = user
            .friends
            .iter()
            .map(|id| self.get_user(*id))
            .collect::<Result<Vec<_>, _>>()?;
        friends.sort_by_key(|friend| friend.id);
        Ok(friends)
    }

    fn common_friends(&self, user_id: u64, other_id: u64) -> Result<Vec<User>, Error> {
        let user = self.get_user(user_id)?;
        let other = self.get_user(other_id)?;
        let mut common = user
            .friends
            .intersection(&other.friends)
            .map(|id| self.get_user(*id))
            .collect::<Result<Vec<_>, _>>()?;
        common.sort_by_key(|friend| friend.id);
        Ok(common)
    }
}
