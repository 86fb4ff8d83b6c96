/// A record kept in a sequenced (counter-backed) table.
///
/// The store assigns `id` on append; `NAMESPACE` gives each record type its
/// own key prefix.
pub trait Record: prost::Message + Default + Clone {
    /// Key namespace for this record type, e.g. `"DidRegistry/"`.
    const NAMESPACE: &'static str;

    fn id(&self) -> u64;

    fn set_id(&mut self, id: u64);
}

macro_rules! impl_record {
    ($ty:ty, $ns:literal) => {
        impl Record for $ty {
            const NAMESPACE: &'static str = $ns;

            fn id(&self) -> u64 {
                self.id
            }

            fn set_id(&mut self, id: u64) {
                self.id = id;
            }
        }
    };
}

impl_record!(crate::records::DidRegistry, "DidRegistry/");
impl_record!(crate::records::UserInfo, "UserInfo/");
impl_record!(crate::records::AppInfo, "AppInfo/");
impl_record!(crate::records::UserRelation, "UserRelation/");
