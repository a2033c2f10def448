pub mod domain;
pub mod ports;

pub use domain::{
    institutional_email, AlertLevel, CampusAlert, CampusLocation, EscortRequest, EscortStatus,
    FriendWalk, FriendWalkStatus, GeoPoint, Incident, IncidentStatus, LocationType, NewUser,
    OfficerAssignment, ProfileUpdate, SosAlert, SosStatus, StatusMachine, TrustedContact,
    UnknownVariant, User, UserCredentials, WalkTooLong, INITIAL_ESCORT_WAIT_MINUTES,
    MAX_WALK_MINUTES,
};
pub use ports::{DatabaseService, PortError, PortResult};
