#[cfg(test)]
mod store_tests {
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    use crate::models::credentials::UserCredentials;
    use crate::services::store::{
        CredentialStore, FileCredentialStore, MemoryCredentialStore, StoreError,
    };

    #[test]
    fn test_store_creation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let path_str = path.to_str().unwrap();

        let _store = FileCredentialStore::new(path_str);
        assert!(Path::new(path_str).exists());
        assert_eq!(fs::read_to_string(path_str).unwrap(), "{}");

        dir.close().unwrap();
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = FileCredentialStore::new(path.to_str().unwrap());

        let credentials = UserCredentials::new("student@smu.edu.sg", "hunter2hunter2");
        store.store("12345", &credentials).unwrap();

        let loaded = store.load("12345").unwrap().unwrap();
        assert_eq!(loaded.email, "student@smu.edu.sg");
        assert_eq!(loaded.password, "hunter2hunter2");

        assert!(store.load("99999").unwrap().is_none());
    }

    #[test]
    fn test_overwrite_is_last_writer_wins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = FileCredentialStore::new(path.to_str().unwrap());

        store
            .store("12345", &UserCredentials::new("old@smu.edu.sg", "oldpassword"))
            .unwrap();
        store
            .store("12345", &UserCredentials::new("new@smu.edu.sg", "newpassword"))
            .unwrap();

        let loaded = store.load("12345").unwrap().unwrap();
        assert_eq!(loaded.email, "new@smu.edu.sg");
        assert_eq!(loaded.password, "newpassword");
    }

    #[test]
    fn test_entries_are_namespaced_per_user() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = FileCredentialStore::new(path.to_str().unwrap());

        store
            .store("alice", &UserCredentials::new("a@smu.edu.sg", "password-a"))
            .unwrap();
        store
            .store("bob", &UserCredentials::new("b@smu.edu.sg", "password-b"))
            .unwrap();

        assert_eq!(store.load("alice").unwrap().unwrap().email, "a@smu.edu.sg");
        assert_eq!(store.load("bob").unwrap().unwrap().email, "b@smu.edu.sg");
    }

    #[test]
    fn test_loaded_credentials_never_reserialize_the_password() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = FileCredentialStore::new(path.to_str().unwrap());

        store
            .store("12345", &UserCredentials::new("student@smu.edu.sg", "hunter2hunter2"))
            .unwrap();

        let loaded = store.load("12345").unwrap().unwrap();
        let rendered = serde_json::to_string(&loaded).unwrap();
        assert!(rendered.contains("student@smu.edu.sg"));
        assert!(!rendered.contains("hunter2hunter2"));
    }

    #[test]
    fn test_corrupt_file_surfaces_as_store_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, "not json at all").unwrap();

        let store = FileCredentialStore::new(path.to_str().unwrap());
        assert!(matches!(
            store.load("12345"),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryCredentialStore::new();
        assert!(store.load("12345").unwrap().is_none());

        store
            .store("12345", &UserCredentials::new("student@smu.edu.sg", "hunter2hunter2"))
            .unwrap();
        let loaded = store.load("12345").unwrap().unwrap();
        assert_eq!(loaded.email, "student@smu.edu.sg");
    }
}
