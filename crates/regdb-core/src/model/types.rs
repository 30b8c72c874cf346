use std::fmt;

// Declares a named enum with a stable wire name per variant, plus `ALL`,
// `name()` and case-insensitive `from_name()`.
macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident => $label:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub enum $name {
            $( $variant, )+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[ $( Self::$variant, )+ ];

            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }

            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                let name = name.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.name().eq_ignore_ascii_case(name))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

named_enum! {
    ///
    /// AttributeType
    ///
    /// Every attribute name the registry understands.
    ///
    pub enum AttributeType {
        Address => "address",
        AdminC => "admin-c",
        AsName => "as-name",
        Auth => "auth",
        AutNum => "aut-num",
        Changed => "changed",
        Country => "country",
        Descr => "descr",
        EMail => "e-mail",
        FaxNo => "fax-no",
        Inet6num => "inet6num",
        Inetnum => "inetnum",
        Irt => "irt",
        MntBy => "mnt-by",
        MntIrt => "mnt-irt",
        MntRef => "mnt-ref",
        MntRoutes => "mnt-routes",
        Mntner => "mntner",
        Netname => "netname",
        NicHdl => "nic-hdl",
        Org => "org",
        OrgName => "org-name",
        OrgType => "org-type",
        Organisation => "organisation",
        Origin => "origin",
        Person => "person",
        Phone => "phone",
        Remarks => "remarks",
        Role => "role",
        Route => "route",
        Route6 => "route6",
        Source => "source",
        Status => "status",
        TechC => "tech-c",
        UpdTo => "upd-to",
    }
}

impl AttributeType {
    /// Attributes whose single line may carry a comma-separated list of keys.
    #[must_use]
    pub const fn is_list(self) -> bool {
        matches!(
            self,
            Self::MntBy | Self::MntRef | Self::MntRoutes | Self::MntIrt
        )
    }
}

named_enum! {
    ///
    /// ObjectType
    ///
    /// Record types; each is named after its type attribute.
    ///
    pub enum ObjectType {
        AutNum => "aut-num",
        Inet6num => "inet6num",
        Inetnum => "inetnum",
        Irt => "irt",
        Mntner => "mntner",
        Organisation => "organisation",
        Person => "person",
        Role => "role",
        Route => "route",
        Route6 => "route6",
    }
}

impl ObjectType {
    /// The attribute that opens a record of this type.
    #[must_use]
    pub const fn type_attribute(self) -> AttributeType {
        match self {
            Self::AutNum => AttributeType::AutNum,
            Self::Inet6num => AttributeType::Inet6num,
            Self::Inetnum => AttributeType::Inetnum,
            Self::Irt => AttributeType::Irt,
            Self::Mntner => AttributeType::Mntner,
            Self::Organisation => AttributeType::Organisation,
            Self::Person => AttributeType::Person,
            Self::Role => AttributeType::Role,
            Self::Route => AttributeType::Route,
            Self::Route6 => AttributeType::Route6,
        }
    }

    #[must_use]
    pub fn from_type_attribute(attribute: AttributeType) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|object_type| object_type.type_attribute() == attribute)
    }

    /// Attributes whose clean values, concatenated in order, form the primary key.
    #[must_use]
    pub const fn key_attributes(self) -> &'static [AttributeType] {
        match self {
            Self::Person | Self::Role => &[AttributeType::NicHdl],
            Self::Route => &[AttributeType::Route, AttributeType::Origin],
            Self::Route6 => &[AttributeType::Route6, AttributeType::Origin],
            Self::AutNum => &[AttributeType::AutNum],
            Self::Inet6num => &[AttributeType::Inet6num],
            Self::Inetnum => &[AttributeType::Inetnum],
            Self::Irt => &[AttributeType::Irt],
            Self::Mntner => &[AttributeType::Mntner],
            Self::Organisation => &[AttributeType::Organisation],
        }
    }

    /// Types whose primary keys share one namespace map to the same value.
    /// Person and role both key on `nic-hdl`, so a handle is either one or
    /// the other.
    #[must_use]
    pub const fn key_namespace(self) -> Self {
        match self {
            Self::Role => Self::Person,
            other => other,
        }
    }

    /// Reference attributes through which other records point at this type.
    #[must_use]
    pub const fn referenced_by(self) -> &'static [AttributeType] {
        match self {
            Self::Mntner => &[
                AttributeType::MntBy,
                AttributeType::MntRef,
                AttributeType::MntRoutes,
            ],
            Self::Organisation => &[AttributeType::Org],
            Self::Irt => &[AttributeType::MntIrt],
            Self::Person | Self::Role => &[AttributeType::AdminC, AttributeType::TechC],
            Self::AutNum | Self::Inet6num | Self::Inetnum | Self::Route | Self::Route6 => &[],
        }
    }

    #[must_use]
    pub const fn is_route(self) -> bool {
        matches!(self, Self::Route | Self::Route6)
    }
}
