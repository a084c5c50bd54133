// Bindings for the deployed Hospital contract.
//
// Only the functions and events this service uses are declared; the layout
// must match the deployed contract.

use ethers::contract::abigen;

abigen!(
    HospitalContract,
    r#"[
        function isUserRegistered(string userUID) external view returns (bool)
        function registerDoctor(string userUID, string cid, string specialization) external
        function registerPatient(string userUID, string cid, string issue, bool isSerious) external
        function createSession(string did, string userUID, bytes32 keyHash, uint256 duration) external
        function validateLogin(string did, string userUID, bytes32 keyHash) external
        function setDoctorPublicKey(string did, string publicKey) external
        event DoctorRegistered(string did, string cid, string specialization, bool firstLogin)
        event PatientRegistered(string did, string cid, bool firstLogin, string assignedDoctorDID, bool success)
        event SessionCreated(string userDID, uint256 expiry, bool success)
        event DoctorLoginStatus(string did, string cid, bool isFirstLogin, bool success, string message)
    ]"#
);
